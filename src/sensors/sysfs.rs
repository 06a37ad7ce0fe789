//! Sysfs thermal zone / hwmon temperature source
//!
//! Reads kernel-exposed temperature files. These report millidegrees
//! Celsius (`54000` for 54°C); a handful of older drivers report plain
//! degrees, so small values pass through unscaled.

use crate::domain::{SourceKind, Temperature};
use crate::error::SensorError;
use crate::sensors::TempSource;
use std::fs;
use std::path::PathBuf;

/// Temperature source over one or more sysfs input files
pub struct SysfsThermalSource {
    paths: Vec<PathBuf>,
}

impl SysfsThermalSource {
    /// Create a source over the given input files
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    fn read_one(path: &PathBuf) -> Result<Temperature, SensorError> {
        let content = fs::read_to_string(path)?;
        let raw: i64 = content.trim_end().parse().map_err(|_| {
            SensorError::Unparseable {
                origin: path.display().to_string(),
                detail: format!("not a number: {:?}", content.trim_end()),
            }
        })?;
        Ok(Temperature::new(scale_raw(raw)))
    }
}

/// Millidegree values are three orders of magnitude above any plausible
/// Celsius reading; anything at or above 1000 gets divided down.
fn scale_raw(raw: i64) -> i32 {
    if raw.abs() >= 1000 {
        (raw / 1000) as i32
    } else {
        raw as i32
    }
}

impl TempSource for SysfsThermalSource {
    fn kind(&self) -> SourceKind {
        SourceKind::ThermalZone
    }

    fn read(&self) -> Result<Vec<Temperature>, SensorError> {
        let mut values = Vec::with_capacity(self.paths.len());
        let mut last_err = None;
        for path in &self.paths {
            match Self::read_one(path) {
                Ok(temp) => values.push(temp),
                Err(err) => {
                    log::debug!("sysfs read failed for {}: {}", path.display(), err);
                    last_err = Some(err);
                }
            }
        }
        if values.is_empty() {
            return Err(last_err.unwrap_or_else(|| {
                SensorError::NotFound("no sysfs paths configured".to_string())
            }));
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_scale_millidegrees() {
        assert_eq!(scale_raw(54000), 54);
        assert_eq!(scale_raw(54), 54);
        assert_eq!(scale_raw(0), 0);
    }

    #[test]
    fn test_read_millidegree_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "61000").unwrap();

        let source = SysfsThermalSource::new(vec![file.path().to_path_buf()]);
        assert_eq!(source.read().unwrap(), vec![Temperature::new(61)]);
    }

    #[test]
    fn test_read_multiple_files() {
        let mut a = NamedTempFile::new().unwrap();
        writeln!(a, "50000").unwrap();
        let mut b = NamedTempFile::new().unwrap();
        writeln!(b, "62000").unwrap();

        let source =
            SysfsThermalSource::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        assert_eq!(
            source.read().unwrap(),
            vec![Temperature::new(50), Temperature::new(62)]
        );
    }

    #[test]
    fn test_missing_file_fails() {
        let source = SysfsThermalSource::new(vec![PathBuf::from("/nonexistent/temp")]);
        assert!(source.read().is_err());
    }

    #[test]
    fn test_garbage_content_fails() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not-a-temp").unwrap();

        let source = SysfsThermalSource::new(vec![file.path().to_path_buf()]);
        assert!(matches!(
            source.read(),
            Err(SensorError::Unparseable { .. })
        ));
    }
}
