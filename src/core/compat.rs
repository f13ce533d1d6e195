use crate::io::RasterHandle;
use crate::types::{PansharpenError, PansharpenResult, PixelType};

/// True iff every handle reports the same pixel type
///
/// Type tags are compared for identity; neighbouring tags (UInt16/Int16) are
/// just as different as Byte/Float64.
pub fn check_uniform_type(handles: &[&RasterHandle]) -> bool {
    match handles.split_first() {
        Some((first, rest)) => rest.iter().all(|h| h.pixel_type == first.pixel_type),
        None => true,
    }
}

/// The shared pixel type, or a mismatch error listing every role's type
pub fn require_uniform_type(handles: &[&RasterHandle]) -> PansharpenResult<PixelType> {
    let first = handles
        .first()
        .ok_or_else(|| PansharpenError::Config("no input rasters given".to_string()))?;

    if !check_uniform_type(handles) {
        return Err(PansharpenError::TypeMismatch {
            found: handles.iter().map(|h| (h.role, h.pixel_type)).collect(),
        });
    }
    log::debug!("All {} inputs share pixel type {}", handles.len(), first.pixel_type);
    Ok(first.pixel_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoTransform, Role};
    use std::path::PathBuf;

    fn handle(role: Role, pixel_type: PixelType) -> RasterHandle {
        RasterHandle {
            role,
            path: PathBuf::from(format!("{}.tif", role)),
            width: 8,
            height: 8,
            geo_transform: GeoTransform::default(),
            spatial_ref: String::new(),
            no_data: None,
            pixel_type,
        }
    }

    fn scene(types: [PixelType; 5]) -> Vec<RasterHandle> {
        Role::ALL
            .iter()
            .zip(types)
            .map(|(role, pixel_type)| handle(*role, pixel_type))
            .collect()
    }

    #[test]
    fn test_identical_types_pass() {
        for pixel_type in PixelType::ALL {
            let handles = scene([pixel_type; 5]);
            let refs: Vec<&RasterHandle> = handles.iter().collect();
            assert!(check_uniform_type(&refs));
            assert_eq!(require_uniform_type(&refs).unwrap(), pixel_type);
        }
    }

    #[test]
    fn test_any_single_mismatch_fails() {
        for base in PixelType::ALL {
            for other in PixelType::ALL.into_iter().filter(|t| *t != base) {
                for position in 0..5 {
                    let mut types = [base; 5];
                    types[position] = other;
                    let handles = scene(types);
                    let refs: Vec<&RasterHandle> = handles.iter().collect();
                    assert!(
                        !check_uniform_type(&refs),
                        "{} at position {} among {} should mismatch",
                        other,
                        position,
                        base
                    );
                    assert!(matches!(
                        require_uniform_type(&refs),
                        Err(PansharpenError::TypeMismatch { .. })
                    ));
                }
            }
        }
    }

    #[test]
    fn test_adjacent_type_codes_are_unequal() {
        let handles = scene([
            PixelType::UInt16,
            PixelType::Int16,
            PixelType::UInt16,
            PixelType::Int16,
            PixelType::UInt16,
        ]);
        let refs: Vec<&RasterHandle> = handles.iter().collect();
        assert!(!check_uniform_type(&refs));
    }
}
