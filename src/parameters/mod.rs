//! Settings registry and the generated editor panel bound to it.

mod settings;
mod toolbox;
mod value;

pub use settings::{ParametersMap, ParametersTypes, Settings, SharedSettings};
pub use toolbox::{Control, ControlKind, Page, ParameterPanel};
pub use value::{Choice, ParamType, ParamValue, UnknownParamType};
