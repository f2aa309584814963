pub mod definition;
pub mod naming;
pub mod notification;

pub use definition::{
    lists_match, matches, AlarmDefinitionSpec, DefinitionRequest, DesiredDefinition,
    RemoteDefinition,
};
pub use naming::{is_managed, managed_name, MANAGED_SUFFIX};
pub use notification::NotificationMethod;
