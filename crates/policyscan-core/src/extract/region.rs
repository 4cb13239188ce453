//! Coordinate-template extraction over a page image.

use image::DynamicImage;
use tracing::{debug, warn};

use super::cleaners;
use crate::models::geometry::Rect;
use crate::models::record::{EMPTY, ExtractedRecord, Field, FieldKind};
use crate::ocr::TextAcquirer;
use crate::strategy::RegionStrategy;

pub(super) fn extract_regions(
    acquirer: &TextAcquirer,
    image: &DynamicImage,
    strategy: &RegionStrategy,
) -> ExtractedRecord {
    let mut record = ExtractedRecord::new(strategy.company());

    for (field, rect) in strategy.regions() {
        let Some(rect) = rect else {
            debug!("{}: no region for {}", strategy.company(), field);
            continue;
        };

        if field == Field::InsuranceCompany {
            if let Some(label) = strategy.company_label() {
                record.set(field, label);
                continue;
            }
        }

        let mut value = read_field(acquirer, image, rect, field.kind(), field.name());
        if field == Field::PolicyNumber && strategy.compact_policy_number() {
            value.retain(|c| c != ' ' && c != '-');
        }
        record.set(field, value);
    }

    for extra in strategy.extras() {
        let value = read_field(acquirer, image, extra.rect, extra.kind, &extra.name);
        record.extras.insert(extra.name.clone(), value);
    }

    record
}

fn read_field(
    acquirer: &TextAcquirer,
    image: &DynamicImage,
    rect: Rect,
    kind: FieldKind,
    name: &str,
) -> String {
    match acquirer.read_region(image, rect) {
        Ok(raw) => {
            let value = cleaners::clean(kind, &raw);
            debug!("{}: {:?} -> {:?}", name, raw.trim(), value);
            value
        }
        Err(e) => {
            warn!("Could not read {} at {:?}: {}", name, rect, e);
            EMPTY.to_string()
        }
    }
}
