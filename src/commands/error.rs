//! Command errors and partial-apply recovery

use thiserror::Error;
use tracing::warn;

use crate::storage::StateStore;
use crate::terraform::ApplyError;

#[derive(Debug, Error)]
pub enum LbsError {
    #[error("--type is a required flag")]
    MissingLbType,

    #[error("\"{0}\" is not a valid lb type, valid lb types are: concourse and cf")]
    InvalidLbType(String),

    #[error(
        "bbl already has a {0} load balancer attached, \
         please remove the previous load balancer before attaching a new one"
    )]
    LbAlreadyExists(String),

    #[error("no load balancer to delete")]
    NoLbToDelete,

    #[error("no lbs found")]
    NoLbsFound,

    #[error("open {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("the following errors occurred:\n{}", .0.join(",\n"))]
    Multiple(Vec<String>),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persist what a failed apply left behind before reporting the failure.
///
/// A recoverable failure has its partial state saved and is returned as is,
/// with terraform's work dir removed. If the partial state cannot be fetched
/// or saved, every message is reported together; when only the save failed
/// the work dir is left on disk so the state is not lost.
pub(crate) async fn recover_from_apply(err: ApplyError, state_store: &dyn StateStore) -> LbsError {
    let mut manager_error = match err {
        ApplyError::Recoverable(manager_error) => manager_error,
        failed => return failed.into(),
    };

    let partial = match manager_error.bbl_state().await {
        Ok(state) => state,
        Err(fetch_error) => {
            return LbsError::Multiple(vec![manager_error.to_string(), fetch_error.to_string()])
        }
    };

    if let Err(persist_error) = state_store.set(&partial).await {
        if let Some(workdir) = manager_error.take_workdir() {
            let kept = workdir.keep();
            warn!(dir = %kept.display(), "Partial terraform state left on disk");
        }
        return LbsError::Multiple(vec![manager_error.to_string(), persist_error.to_string()]);
    }

    // The work dir holds key material.
    drop(manager_error.take_workdir());

    warn!(error = %manager_error, "Apply failed, partial state saved");
    ApplyError::Recoverable(manager_error).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeStateStore;
    use crate::storage::State;
    use crate::terraform::{ExecutorError, ManagerError};
    use std::path::PathBuf;

    fn recoverable_in_workdir() -> (ApplyError, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let path = root.join("terraform.tfstate");
        std::fs::write(&path, "some-partial-tf-state").unwrap();

        let executor_error = ExecutorError::in_workdir(dir, path, "cannot apply");
        let err = ApplyError::Recoverable(ManagerError::new(State::default(), executor_error));
        (err, root)
    }

    #[tokio::test]
    async fn test_recovery_removes_workdir_once_state_is_saved() {
        let (err, root) = recoverable_in_workdir();
        let store = FakeStateStore::default();

        let err = recover_from_apply(err, &store).await;

        assert_eq!(err.to_string(), "cannot apply");
        assert_eq!(store.set_call.lock().unwrap().receives[0].tf_state, "some-partial-tf-state");
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_recovery_keeps_workdir_when_save_fails() {
        let (err, root) = recoverable_in_workdir();
        let store = FakeStateStore::default();
        store.set_call.lock().unwrap().returns = vec![Some("failed to save state".to_string())];

        let err = recover_from_apply(err, &store).await;

        assert_eq!(
            err.to_string(),
            "the following errors occurred:\ncannot apply,\nfailed to save state"
        );
        assert!(root.join("terraform.tfstate").exists());
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_multiple_errors_format() {
        let err = LbsError::Multiple(vec![
            "cannot apply".to_string(),
            "failed to retrieve bbl state".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "the following errors occurred:\ncannot apply,\nfailed to retrieve bbl state"
        );
    }

    #[test]
    fn test_read_file_format() {
        let err = LbsError::ReadFile {
            path: "/fake/cert/path".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
        };
        assert_eq!(err.to_string(), "open /fake/cert/path: no such file or directory");
    }

    #[test]
    fn test_invalid_lb_type_format() {
        assert_eq!(
            LbsError::InvalidLbType("some-invalid-lb".to_string()).to_string(),
            "\"some-invalid-lb\" is not a valid lb type, valid lb types are: concourse and cf"
        );
    }
}
