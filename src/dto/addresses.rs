use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{clean_optional, limit_text, require_text};
use crate::{
    entity::sea_orm_active_enums::AddressType, error::AppResult, models::Address,
};

/// Recipient details as submitted by the client. Two inputs describe the same
/// address when they are equal after [`AddressInput::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl AddressInput {
    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            company: clean_optional(self.company),
            address1: self.address1.trim().to_string(),
            address2: clean_optional(self.address2),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone: clean_optional(self.phone),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        require_text("first_name", &self.first_name, 100)?;
        require_text("last_name", &self.last_name, 100)?;
        require_text("address1", &self.address1, 200)?;
        require_text("city", &self.city, 100)?;
        require_text("state", &self.state, 100)?;
        require_text("postal_code", &self.postal_code, 20)?;
        require_text("country", &self.country, 100)?;
        for (field, value) in [
            ("company", &self.company),
            ("address2", &self.address2),
            ("phone", &self.phone),
        ] {
            if let Some(value) = value {
                limit_text(field, value, 200)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub address_type: AddressType,
    #[serde(flatten)]
    pub address: AddressInput,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub items: Vec<Address>,
}

#[cfg(test)]
mod tests {
    use super::AddressInput;

    pub(crate) fn sample() -> AddressInput {
        AddressInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            company: None,
            address1: "12 St James's Square".into(),
            address2: None,
            city: "London".into(),
            state: "London".into(),
            postal_code: "SW1Y 4JH".into(),
            country: "GB".into(),
            phone: None,
        }
    }

    #[test]
    fn whitespace_and_blank_optionals_do_not_break_equality() {
        let padded = AddressInput {
            first_name: "  Ada ".into(),
            company: Some("   ".into()),
            phone: Some(String::new()),
            ..sample()
        };
        assert_eq!(padded.normalized(), sample().normalized());
    }

    #[test]
    fn different_city_is_a_different_address() {
        let other = AddressInput {
            city: "Paris".into(),
            ..sample()
        };
        assert_ne!(other.normalized(), sample().normalized());
    }

    #[test]
    fn required_fields_are_enforced() {
        assert!(sample().validate().is_ok());
        let missing = AddressInput {
            postal_code: "  ".into(),
            ..sample()
        };
        assert!(missing.normalized().validate().is_err());
    }
}
