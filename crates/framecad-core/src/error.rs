//! 核心错误定义

use crate::entity::EntityId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown part: {0}")]
    UnknownPart(String),

    #[error("Unknown wireframe: {0}")]
    UnknownWireframe(String),

    #[error("Unknown interface: {0}")]
    UnknownInterface(String),

    #[error("Entity {id} has an invalid orientation (not a proper rotation)")]
    InvalidOrientation { id: EntityId },

    #[error("Entity {0} appears more than once")]
    DuplicateMember(EntityId),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
