use thiserror::Error;

use crate::{FrameState, Kernel};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    #[error("invalid scene: {0}")]
    InvalidScene(String),

    #[error("couldn't create `{resource}`: {status}")]
    Resource { resource: String, status: String },

    #[error("couldn't transfer `{resource}`: {status}")]
    Transfer { resource: String, status: String },

    #[error("couldn't dispatch `{kernel}`: {status}")]
    Dispatch { kernel: Kernel, status: String },

    #[error("`{kernel}` declares no such parameter: `{param}`")]
    UnknownParameter { kernel: Kernel, param: String },

    #[error("`{kernel}` is missing parameter `{param}`")]
    UnboundParameter { kernel: Kernel, param: &'static str },

    #[error("`{operation}` can't run while the pipeline is {state}")]
    OutOfOrder {
        operation: &'static str,
        state: FrameState,
    },

    #[error("pipeline is faulted and must be reset")]
    Faulted,

    #[error("surface `{0}` is acquired")]
    SurfaceAcquired(String),

    #[error("surface `{0}` is not acquired")]
    SurfaceNotAcquired(String),
}

impl Error {
    pub(crate) fn resource(
        resource: impl ToString,
        status: impl ToString,
    ) -> Self {
        Self::Resource {
            resource: resource.to_string(),
            status: status.to_string(),
        }
    }

    pub(crate) fn transfer(
        resource: impl ToString,
        status: impl ToString,
    ) -> Self {
        Self::Transfer {
            resource: resource.to_string(),
            status: status.to_string(),
        }
    }

    pub(crate) fn dispatch(kernel: Kernel, status: impl ToString) -> Self {
        Self::Dispatch {
            kernel,
            status: status.to_string(),
        }
    }
}
