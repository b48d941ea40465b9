use uuid::Uuid;

use crate::domain::{
    entities::{clients::ClientEntity, mailings::MailingEntity, messages::MessageEntity},
    value_objects::{enums::roles::Role, mailings::MailingModel},
};

/// The authenticated caller of an invocation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Managers and admins list every owner's records.
    pub fn sees_all(&self) -> bool {
        matches!(self.role, Role::Manager | Role::Admin)
    }

    pub fn owns(&self, resource: &dyn Owned) -> bool {
        resource.owner_id() == Some(self.user_id)
    }
}

pub trait Owned {
    fn owner_id(&self) -> Option<Uuid>;
}

impl Owned for ClientEntity {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
}

impl Owned for MessageEntity {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
}

impl Owned for MailingEntity {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
}

impl Owned for MailingModel {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
}

/// Capability checks applied at the invocation-surface boundary.
pub trait AccessPolicy: Send + Sync {
    fn can_view(&self, actor: &Actor, resource: &dyn Owned) -> bool;
    fn can_mutate(&self, actor: &Actor, resource: &dyn Owned) -> bool;
    fn can_block(&self, actor: &Actor, resource: &dyn Owned) -> bool;
}

/// Owners manage their own records, managers can see and block everything, admins can do
/// anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct OwnerPolicy;

impl AccessPolicy for OwnerPolicy {
    fn can_view(&self, actor: &Actor, resource: &dyn Owned) -> bool {
        actor.sees_all() || actor.owns(resource)
    }

    fn can_mutate(&self, actor: &Actor, resource: &dyn Owned) -> bool {
        actor.role == Role::Admin || actor.owns(resource)
    }

    fn can_block(&self, actor: &Actor, _resource: &dyn Owned) -> bool {
        matches!(actor.role, Role::Manager | Role::Admin)
    }
}
