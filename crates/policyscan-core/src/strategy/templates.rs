//! Built-in coordinate templates, measured on 300 DPI declaration pages.

use super::{RegionStrategy, RegistryBuilder};
use crate::models::company::Company;
use crate::models::record::{Field, FieldKind};

type Region = (u32, u32, u32, u32);

/// Regions shared by every declaration-page layout.
struct Layout {
    company: Company,
    insurance_company: Region,
    policy_number: Region,
    date_prepared: Region,
    insured_name: Region,
    mailing_street: Region,
    mailing_city_state: Region,
    premium: Region,
    property_address: Region,
    effective_date: Region,
    expiration_date: Region,
}

const LAYOUTS: &[Layout] = &[
    Layout {
        company: Company::Nationwide,
        insurance_company: (190, 42, 150, 30),
        policy_number: (530, 84, 150, 20),
        date_prepared: (720, 84, 150, 20),
        insured_name: (518, 242, 250, 20),
        mailing_street: (518, 260, 300, 20),
        mailing_city_state: (518, 277, 300, 20),
        premium: (830, 741, 60, 20),
        property_address: (518, 260, 300, 40),
        effective_date: (150, 450, 150, 20),
        expiration_date: (150, 470, 150, 20),
    },
    Layout {
        company: Company::StateFarm,
        insurance_company: (100, 40, 200, 35),
        policy_number: (400, 85, 150, 22),
        date_prepared: (580, 85, 100, 22),
        insured_name: (400, 210, 280, 22),
        mailing_street: (400, 235, 280, 22),
        mailing_city_state: (400, 260, 280, 22),
        premium: (600, 640, 160, 22),
        property_address: (130, 310, 320, 22),
        effective_date: (420, 160, 130, 22),
        expiration_date: (580, 160, 130, 22),
    },
    Layout {
        company: Company::Allstate,
        insurance_company: (120, 30, 180, 40),
        policy_number: (430, 80, 140, 20),
        date_prepared: (600, 80, 95, 20),
        insured_name: (420, 200, 270, 20),
        mailing_street: (420, 220, 270, 20),
        mailing_city_state: (420, 240, 270, 20),
        premium: (620, 625, 155, 20),
        property_address: (140, 295, 310, 20),
        effective_date: (435, 155, 125, 20),
        expiration_date: (590, 155, 125, 20),
    },
    Layout {
        company: Company::Progressive,
        insurance_company: (140, 35, 170, 35),
        policy_number: (445, 82, 135, 21),
        date_prepared: (605, 82, 98, 21),
        insured_name: (430, 205, 265, 21),
        mailing_street: (430, 227, 265, 21),
        mailing_city_state: (430, 249, 265, 21),
        premium: (630, 635, 158, 21),
        property_address: (145, 305, 315, 21),
        effective_date: (440, 158, 128, 21),
        expiration_date: (595, 158, 128, 21),
    },
    Layout {
        company: Company::Usaa,
        insurance_company: (130, 38, 160, 32),
        policy_number: (440, 78, 130, 19),
        date_prepared: (595, 78, 93, 19),
        insured_name: (425, 203, 260, 19),
        mailing_street: (425, 224, 260, 19),
        mailing_city_state: (425, 245, 260, 19),
        premium: (625, 628, 153, 19),
        property_address: (135, 298, 305, 19),
        effective_date: (433, 153, 123, 19),
        expiration_date: (588, 153, 123, 19),
    },
    Layout {
        company: Company::Travelers,
        insurance_company: (145, 32, 175, 38),
        policy_number: (450, 84, 138, 22),
        date_prepared: (608, 84, 97, 22),
        insured_name: (435, 208, 268, 22),
        mailing_street: (435, 232, 268, 22),
        mailing_city_state: (435, 256, 268, 22),
        premium: (635, 638, 160, 22),
        property_address: (148, 308, 318, 22),
        effective_date: (443, 161, 130, 22),
        expiration_date: (600, 161, 130, 22),
    },
    Layout {
        company: Company::LibertyMutual,
        insurance_company: (125, 36, 185, 34),
        policy_number: (442, 79, 133, 20),
        date_prepared: (600, 79, 94, 20),
        insured_name: (428, 204, 263, 20),
        mailing_street: (428, 226, 263, 20),
        mailing_city_state: (428, 248, 263, 20),
        premium: (628, 630, 155, 20),
        property_address: (138, 300, 308, 20),
        effective_date: (436, 155, 125, 20),
        expiration_date: (590, 155, 125, 20),
    },
    Layout {
        company: Company::Farmers,
        insurance_company: (135, 34, 165, 36),
        policy_number: (448, 81, 136, 21),
        date_prepared: (603, 81, 96, 21),
        insured_name: (432, 206, 266, 21),
        mailing_street: (432, 229, 266, 21),
        mailing_city_state: (432, 252, 266, 21),
        premium: (632, 633, 157, 21),
        property_address: (143, 303, 313, 21),
        effective_date: (440, 157, 127, 21),
        expiration_date: (593, 157, 127, 21),
    },
    Layout {
        company: Company::Geico,
        insurance_company: (150, 37, 155, 33),
        policy_number: (455, 83, 125, 20),
        date_prepared: (607, 83, 92, 20),
        insured_name: (437, 207, 255, 20),
        mailing_street: (437, 230, 255, 20),
        mailing_city_state: (437, 253, 255, 20),
        premium: (637, 636, 152, 20),
        property_address: (150, 306, 305, 20),
        effective_date: (445, 159, 122, 20),
        expiration_date: (595, 159, 122, 20),
    },
    Layout {
        company: Company::Generic,
        insurance_company: (150, 35, 160, 35),
        policy_number: (450, 80, 130, 20),
        date_prepared: (600, 80, 95, 20),
        insured_name: (430, 205, 260, 20),
        mailing_street: (430, 227, 260, 20),
        mailing_city_state: (430, 249, 260, 20),
        premium: (630, 632, 155, 20),
        property_address: (145, 302, 310, 20),
        effective_date: (438, 156, 125, 20),
        expiration_date: (590, 156, 125, 20),
    },
];

impl Layout {
    fn strategy(&self) -> RegionStrategy {
        let strategy = RegionStrategy::new(self.company)
            .with_region(Field::InsuranceCompany, self.insurance_company)
            .with_region(Field::PolicyNumber, self.policy_number)
            .with_region(Field::PolicyholderName, self.insured_name)
            .with_region(Field::PropertyAddress, self.property_address)
            .with_region(Field::PremiumAmount, self.premium)
            .with_region(Field::EffectiveDate, self.effective_date)
            .with_region(Field::ExpirationDate, self.expiration_date)
            .with_extra("date_prepared", FieldKind::Date, self.date_prepared)
            .with_extra("mailing_street", FieldKind::Address, self.mailing_street)
            .with_extra("mailing_city_state", FieldKind::Address, self.mailing_city_state);

        if self.company.is_generic() {
            strategy
        } else {
            strategy.with_company_label(self.company.display_name())
        }
    }
}

pub(super) fn builder() -> RegistryBuilder {
    let mut builder = RegistryBuilder::default();
    for layout in LAYOUTS {
        let strategy = layout.strategy();
        let strategy = match layout.company {
            Company::Nationwide => strategy
                .with_extra("agent_name", FieldKind::Name, (103, 330, 200, 20))
                .with_extra("agent_number", FieldKind::Text, (103, 347, 150, 20)),
            Company::StateFarm => strategy
                .with_extra("agent_name", FieldKind::Name, (420, 280, 200, 20))
                .with_compact_policy_number(),
            _ => strategy,
        };
        builder.insert(strategy);
    }
    builder
}
