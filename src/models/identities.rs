use crate::common::error::{AppError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const MAX_IDENTITY_ID_LEN: usize = 64;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    Customer,
    Seller,
}

impl IdentityKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::Customer => "customer",
            IdentityKind::Seller => "seller",
        }
    }
}

impl FromStr for IdentityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(IdentityKind::Customer),
            "seller" => Ok(IdentityKind::Seller),
            _ => Err(AppError::IdentitiesInvalid),
        }
    }
}

impl Display for IdentityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant reference. Customers and sellers live in separate
/// collections that may share an id space, so the kind is always carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct IdentityRef {
    pub kind: IdentityKind,
    pub id: String,
}

impl IdentityRef {
    pub fn new(kind: IdentityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self::new(IdentityKind::Customer, id)
    }

    pub fn seller(id: impl Into<String>) -> Self {
        Self::new(IdentityKind::Seller, id)
    }

    pub fn from_parts(kind: &str, id: String) -> ServiceResult<Self> {
        let identity = Self::new(IdentityKind::from_str(kind)?, id);
        identity.validate()?;
        Ok(identity)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        let id = self.id.as_str();
        if id.is_empty()
            || id == "."
            || id == ".."
            || id.chars().count() > MAX_IDENTITY_ID_LEN
            || id
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '|' | ':' | '/'))
        {
            return Err(AppError::IdentitiesInvalid);
        }
        Ok(())
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl Display for IdentityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_id_different_kind_are_distinct() {
        let customer = IdentityRef::customer("42");
        let seller = IdentityRef::seller("42");
        assert_ne!(customer, seller);
        assert_ne!(customer.key(), seller.key());
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(IdentityRef::customer("").validate().is_err());
        assert!(IdentityRef::customer("a b").validate().is_err());
        assert!(IdentityRef::customer("x".repeat(65)).validate().is_err());
        assert!(IdentityRef::seller("65f1c0a9e4b0").validate().is_ok());
    }

    #[test]
    fn rejects_path_like_ids() {
        for id in ["../admin", "a/b", ".", ".."] {
            assert!(IdentityRef::customer(id).validate().is_err(), "{id}");
        }
        assert!(IdentityRef::customer("c.alice").validate().is_ok());
    }

    #[test]
    fn parses_kind_from_parts() {
        let identity = IdentityRef::from_parts("seller", "s-1".to_owned()).unwrap();
        assert_eq!(identity, IdentityRef::seller("s-1"));
        assert!(IdentityRef::from_parts("admin", "a-1".to_owned()).is_err());
    }

    #[test]
    fn serializes_as_tagged_pair() {
        let json = serde_json::to_string(&IdentityRef::customer("c-1")).unwrap();
        assert_eq!(json, r#"{"kind":"customer","id":"c-1"}"#);
    }
}
