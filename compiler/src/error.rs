use std::path::PathBuf;

use nidl_schema::SjsonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NidlError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Parse {
        path:   PathBuf,
        #[source]
        source: SjsonError,
    },

    #[error("{entity}: {reason}")]
    Validation {
        entity: String,
        reason: String,
    },

    #[error("{entity}: unknown type \"{type_name}\"")]
    UnknownType {
        entity:    String,
        type_name: String,
    },

    #[error("\"{name}\" is declared in both {first} and {second}")]
    DuplicateName {
        name:   String,
        first:  &'static str,
        second: &'static str,
    },

    #[error("{section}.{name} from {} overrides an existing declaration", path.display())]
    DependencyCollision {
        section: String,
        name:    String,
        path:    PathBuf,
    },

    #[error("Dependency cycle through {}", .0.display())]
    DependencyCycle(PathBuf),

    #[error("Namespace scopes left open or closed out of order: {0}")]
    UnbalancedNamespace(String),

    #[error("Write error: {0}")]
    Sink(#[from] std::io::Error),

    #[error("{0}")]
    Emit(String),
}

impl NidlError {
    pub fn validation(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        NidlError::Validation {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// The schema entry, file or subsystem the error is about.
    pub fn entity(&self) -> String {
        match self {
            NidlError::Io { path, .. } | NidlError::Parse { path, .. } => path.display().to_string(),
            NidlError::Validation { entity, .. } | NidlError::UnknownType { entity, .. } => entity.clone(),
            NidlError::DuplicateName { name, .. } => name.clone(),
            NidlError::DependencyCollision { section, name, .. } => format!("{}.{}", section, name),
            NidlError::DependencyCycle(path) => path.display().to_string(),
            NidlError::UnbalancedNamespace(_) | NidlError::Sink(_) | NidlError::Emit(_) => {
                "generator".to_string()
            }
        }
    }

    /// The human readable part of the message, without the entity prefix.
    pub fn reason(&self) -> String {
        match self {
            NidlError::Io { source, .. } => source.to_string(),
            NidlError::Parse { source, .. } => source.to_string(),
            NidlError::Validation { reason, .. } => reason.clone(),
            NidlError::UnknownType { type_name, .. } => format!("unknown type \"{}\"", type_name),
            other => other.to_string(),
        }
    }

    /// Attach the output path to a sink error raised while writing it.
    pub(crate) fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            NidlError::Sink(source) => NidlError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}
