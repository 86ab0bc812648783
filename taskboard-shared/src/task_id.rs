/// Human-readable task identifier allocation
///
/// Every task carries a `TASK-NNNNN` identifier alongside its opaque row id,
/// where NNNNN is a uniformly random 5-digit number in [10000, 99999].
/// Uniqueness is enforced by the UNIQUE constraint on `tasks.task_id`; the
/// task insert itself is retried with a fresh candidate on collision, up to
/// [`MAX_ATTEMPTS`] times.
///
/// Capacity caveat: the namespace holds 90,000 values, so collisions only
/// become likely as the task table approaches tens of thousands of rows. At
/// that scale the retry bound (or the id width) has to grow.

use rand::Rng;

/// Prefix of every human-readable task identifier
pub const TASK_ID_PREFIX: &str = "TASK-";

/// Maximum number of allocation attempts before giving up
pub const MAX_ATTEMPTS: u32 = 10;

/// Error type for task id allocation
#[derive(Debug, thiserror::Error)]
pub enum TaskIdError {
    /// All allocation attempts collided with existing identifiers
    #[error("failed to allocate a unique task id after {0} attempts")]
    Exhausted(u32),

    /// Database error during allocation
    #[error("database error during task id allocation: {0}")]
    Database(#[from] sqlx::Error),
}

/// Generates a random task id candidate
///
/// The candidate is not checked for uniqueness here; callers insert it under
/// the unique constraint and retry on collision.
///
/// # Example
///
/// ```
/// use taskboard_shared::task_id::random_task_id;
///
/// let id = random_task_id();
/// assert!(id.starts_with("TASK-"));
/// assert_eq!(id.len(), 10);
/// ```
pub fn random_task_id() -> String {
    let digits = rand::thread_rng().gen_range(10_000..=99_999);
    format!("{TASK_ID_PREFIX}{digits}")
}

/// Checks whether a string is a well-formed task identifier
pub fn is_valid_task_id(candidate: &str) -> bool {
    match candidate.strip_prefix(TASK_ID_PREFIX) {
        Some(digits) => {
            digits.len() == 5
                && digits.chars().all(|c| c.is_ascii_digit())
                && !digits.starts_with('0')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_task_id_format() {
        for _ in 0..1000 {
            let id = random_task_id();
            assert!(is_valid_task_id(&id), "malformed task id: {}", id);
        }
    }

    #[test]
    fn test_random_task_id_range() {
        for _ in 0..1000 {
            let id = random_task_id();
            let digits: u32 = id[TASK_ID_PREFIX.len()..].parse().unwrap();
            assert!((10_000..=99_999).contains(&digits));
        }
    }

    #[test]
    fn test_is_valid_task_id() {
        assert!(is_valid_task_id("TASK-10000"));
        assert!(is_valid_task_id("TASK-99999"));

        assert!(!is_valid_task_id("TASK-00001")); // below range
        assert!(!is_valid_task_id("TASK-1234")); // too short
        assert!(!is_valid_task_id("TASK-123456")); // too long
        assert!(!is_valid_task_id("TASK-1234a"));
        assert!(!is_valid_task_id("task-12345"));
        assert!(!is_valid_task_id("12345"));
    }

    #[test]
    fn test_exhausted_error_message() {
        let err = TaskIdError::Exhausted(MAX_ATTEMPTS);
        assert!(err.to_string().contains("10 attempts"));
    }
}
