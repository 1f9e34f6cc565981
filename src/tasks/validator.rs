//! # Submission-time parameter validation.
//!
//! Every task type accepted by `submit_task` needs a validator; a task type
//! without one is rejected like invalid params. Validators are synchronous
//! and must not touch the application.

use std::sync::Arc;

use crate::tasks::task::Params;

/// Shared validator: `Ok(())` accepts, `Err(reason)` rejects.
pub type Validator = Arc<dyn Fn(&Params) -> Result<(), String> + Send + Sync>;

/// Ready-made validators.
pub mod validators {
    use super::Params;

    /// Accepts only an empty params object.
    pub fn no_params(params: &Params) -> Result<(), String> {
        if params.is_empty() {
            Ok(())
        } else {
            Err("no params expected".to_string())
        }
    }

    /// Accepts any object containing every key in `keys`.
    pub fn required_keys(
        keys: &'static [&'static str],
    ) -> impl Fn(&Params) -> Result<(), String> + Send + Sync + 'static {
        move |params| {
            let missing: Vec<&str> = keys
                .iter()
                .copied()
                .filter(|k| !params.contains_key(*k))
                .collect();
            if missing.is_empty() {
                Ok(())
            } else {
                Err(format!("missing params: {}", missing.join(", ")))
            }
        }
    }

    /// Accepts everything.
    pub fn any(_: &Params) -> Result<(), String> {
        Ok(())
    }
}
