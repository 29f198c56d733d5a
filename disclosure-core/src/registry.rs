//! Principal registry
//!
//! Tracks the owner, the single regulator and the set of authorized
//! reporting entities. Every mutating call checks the caller's role first
//! and changes nothing when the check fails.

use crate::{
    types::{Principal, Role},
    Error, Result,
};
use std::collections::BTreeSet;

/// Owner, regulator and authorized entities
#[derive(Debug, Clone)]
pub struct PrincipalRegistry {
    owner: Principal,
    regulator: Principal,
    entities: BTreeSet<Principal>,
}

impl PrincipalRegistry {
    /// Create registry with the configured owner and initial regulator
    pub fn new(owner: Principal, regulator: Principal) -> Result<Self> {
        if owner.is_null() {
            return Err(Error::InvalidPrincipal("owner must not be null".to_string()));
        }
        if regulator.is_null() {
            return Err(Error::InvalidPrincipal(
                "regulator must not be null".to_string(),
            ));
        }
        Ok(Self {
            owner,
            regulator,
            entities: BTreeSet::new(),
        })
    }

    pub(crate) fn from_parts(
        owner: Principal,
        regulator: Principal,
        entities: impl IntoIterator<Item = Principal>,
    ) -> Result<Self> {
        let mut registry = Self::new(owner, regulator)?;
        for entity in entities {
            if entity.is_null() || registry.is_regulator(&entity) {
                return Err(Error::InvalidState(format!(
                    "{} cannot be an authorized entity",
                    entity
                )));
            }
            registry.entities.insert(entity);
        }
        Ok(registry)
    }

    /// System owner
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Current regulator
    pub fn regulator(&self) -> &Principal {
        &self.regulator
    }

    /// Whether `principal` is the current regulator
    pub fn is_regulator(&self, principal: &Principal) -> bool {
        &self.regulator == principal
    }

    /// Whether `entity` may currently submit
    pub fn is_authorized(&self, entity: &Principal) -> bool {
        self.entities.contains(entity)
    }

    /// Authorized entities in sorted order
    pub fn authorized_entities(&self) -> impl Iterator<Item = &Principal> {
        self.entities.iter()
    }

    /// Fail with `Unauthorized` unless `caller` holds `role`
    pub fn require(&self, caller: &Principal, role: Role) -> Result<()> {
        let holds = match role {
            Role::Owner => &self.owner == caller,
            Role::Regulator => &self.regulator == caller,
            Role::Entity => self.entities.contains(caller),
        };
        if holds {
            Ok(())
        } else {
            Err(Error::unauthorized(caller, role))
        }
    }

    /// Authorize an entity. Returns `false` when it was already authorized.
    pub fn authorize(&mut self, caller: &Principal, entity: &Principal) -> Result<bool> {
        self.require(caller, Role::Regulator)?;
        if entity.is_null() {
            return Err(Error::InvalidPrincipal(
                "cannot authorize the null identity".to_string(),
            ));
        }
        if self.is_regulator(entity) {
            return Err(Error::InvalidPrincipal(format!(
                "{} is the regulator and cannot report as an entity",
                entity
            )));
        }
        Ok(self.entities.insert(entity.clone()))
    }

    /// Revoke an entity. Returns `false` when it was not authorized.
    pub fn revoke(&mut self, caller: &Principal, entity: &Principal) -> Result<bool> {
        self.require(caller, Role::Regulator)?;
        if entity.is_null() {
            return Err(Error::InvalidPrincipal(
                "cannot revoke the null identity".to_string(),
            ));
        }
        Ok(self.entities.remove(entity))
    }

    /// Replace the regulator. Returns the outgoing regulator.
    pub fn update_regulator(
        &mut self,
        caller: &Principal,
        new_regulator: &Principal,
    ) -> Result<Principal> {
        self.require(caller, Role::Owner)?;
        if new_regulator.is_null() {
            return Err(Error::InvalidPrincipal(
                "regulator must not be null".to_string(),
            ));
        }
        if self.entities.contains(new_regulator) {
            return Err(Error::InvalidPrincipal(format!(
                "{} is an authorized entity; revoke it before appointing it regulator",
                new_regulator
            )));
        }
        Ok(std::mem::replace(&mut self.regulator, new_regulator.clone()))
    }
}
