//! Multipart upload planning
//!
//! Splits a payload into the part ranges sent with `UploadPart`.

use super::UploadError;

/// Minimum part size (5MB) - S3 requirement for every part but the last
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Maximum parts allowed
pub const MAX_PARTS: usize = 10000;

/// Default part size (64MB)
pub const DEFAULT_PART_SIZE: usize = 64 * 1024 * 1024;

/// Number of parts of one object in flight at once
pub const PART_CONCURRENCY: usize = 5;

/// One part of a multipart upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    /// 1-based, as S3 expects
    pub part_number: i32,
    pub offset: usize,
    pub len: usize,
}

impl PartRange {
    /// Exclusive end offset
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Whether a payload of `total` bytes goes through multipart upload.
///
/// Payloads that fit in a single part are sent with one `PutObject`.
pub fn needs_multipart(total: usize, part_size: usize) -> bool {
    total > part_size
}

/// Split `total` bytes into parts of `part_size`; the last part may be shorter.
pub fn plan_parts(total: usize, part_size: usize) -> Result<Vec<PartRange>, UploadError> {
    if part_size == 0 {
        return Err(UploadError::InvalidPartSize);
    }

    let count = total.div_ceil(part_size);
    if count > MAX_PARTS {
        return Err(UploadError::TooManyParts {
            parts: count,
            max: MAX_PARTS,
        });
    }

    Ok((0..count)
        .map(|index| {
            let offset = index * part_size;
            PartRange {
                part_number: index as i32 + 1,
                offset,
                len: part_size.min(total - offset),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_exact_multiple() {
        let parts = plan_parts(3 * MIN_PART_SIZE, MIN_PART_SIZE).unwrap();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len == MIN_PART_SIZE));
        assert_eq!(parts[2].end(), 3 * MIN_PART_SIZE);
    }

    #[test]
    fn test_plan_short_last_part() {
        let parts = plan_parts(10, 4).unwrap();
        assert_eq!(
            parts,
            vec![
                PartRange { part_number: 1, offset: 0, len: 4 },
                PartRange { part_number: 2, offset: 4, len: 4 },
                PartRange { part_number: 3, offset: 8, len: 2 },
            ]
        );
    }

    #[test]
    fn test_plan_covers_payload() {
        let total = 150 * 1024 * 1024 + 17;
        let parts = plan_parts(total, DEFAULT_PART_SIZE).unwrap();

        let mut expected_offset = 0;
        for (index, part) in parts.iter().enumerate() {
            assert_eq!(part.part_number, index as i32 + 1);
            assert_eq!(part.offset, expected_offset);
            expected_offset = part.end();
        }
        assert_eq!(expected_offset, total);
    }

    #[test]
    fn test_plan_empty_payload() {
        assert!(plan_parts(0, DEFAULT_PART_SIZE).unwrap().is_empty());
    }

    #[test]
    fn test_plan_zero_part_size() {
        assert!(matches!(plan_parts(10, 0), Err(UploadError::InvalidPartSize)));
    }

    #[test]
    fn test_plan_too_many_parts() {
        let result = plan_parts(MAX_PARTS + 1, 1);
        assert!(matches!(result, Err(UploadError::TooManyParts { parts: 10001, .. })));
    }

    #[test]
    fn test_needs_multipart() {
        assert!(!needs_multipart(DEFAULT_PART_SIZE, DEFAULT_PART_SIZE));
        assert!(needs_multipart(DEFAULT_PART_SIZE + 1, DEFAULT_PART_SIZE));
        assert!(!needs_multipart(0, DEFAULT_PART_SIZE));
    }
}
