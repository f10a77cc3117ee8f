//! Checkout address resolution.
//!
//! A checkout submission carries one choice per address slot: reuse the
//! default address of that kind, or enter a new one. Resolution is planned
//! here as a pure function over the submitted choice and the known default,
//! and the route handler applies the plan through the repositories.
//! Shipping is always resolved before billing.

use aperture_core::AddressId;

use crate::db::addresses::NewAddress;
use crate::models::AddressKind;

/// The user's choice for one address slot.
#[derive(Debug, Clone)]
pub enum AddressChoice {
    /// Reuse the default address of this kind.
    UseDefault,
    /// Enter a new address.
    New(NewAddressFields),
}

/// Raw fields of a newly entered address.
#[derive(Debug, Clone, Default)]
pub struct NewAddressFields {
    pub street_address: String,
    pub apartment_address: String,
    pub country: String,
    pub zip: String,
    pub set_default: bool,
}

/// How one address slot resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Attach this existing default address to the cart.
    Attach(AddressId),
    /// Create this new address row and attach it.
    Create(NewAddress),
    /// "Use default" was selected but no default of this kind exists.
    /// Aborts the whole submission; nothing is written for this slot.
    MissingDefault,
    /// Required fields of the new entry are empty. The slot is left unset
    /// and processing continues with the next slot.
    Incomplete,
}

/// Resolve one address slot against the user's known default of that kind.
///
/// Street, country, and zip are the required fields of a new entry;
/// whitespace-only values count as empty.
#[must_use]
pub fn resolve_slot(
    kind: AddressKind,
    choice: &AddressChoice,
    default: Option<AddressId>,
) -> SlotOutcome {
    match choice {
        AddressChoice::UseDefault => match default {
            Some(id) => SlotOutcome::Attach(id),
            None => SlotOutcome::MissingDefault,
        },
        AddressChoice::New(fields) => {
            let required = [&fields.street_address, &fields.country, &fields.zip];
            if required.iter().any(|f| f.trim().is_empty()) {
                return SlotOutcome::Incomplete;
            }

            SlotOutcome::Create(NewAddress {
                street_address: fields.street_address.clone(),
                apartment_address: fields.apartment_address.clone(),
                country: fields.country.clone(),
                zip: fields.zip.clone(),
                kind,
                make_default: fields.set_default,
            })
        }
    }
}

/// Payment options a checkout can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOption {
    Stripe,
}

impl PaymentOption {
    /// Parse the form-selected payment option.
    ///
    /// Anything unsupported is `None`; the handler warns and re-renders.
    #[must_use]
    pub fn parse(option: &str) -> Option<Self> {
        match option {
            "stripe" => Some(Self::Stripe),
            _ => None,
        }
    }

    /// The payment route path segment for this option.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
        }
    }
}

// NewAddress equality is only needed by the planner tests.
impl PartialEq for NewAddress {
    fn eq(&self, other: &Self) -> bool {
        self.street_address == other.street_address
            && self.apartment_address == other.apartment_address
            && self.country == other.country
            && self.zip == other.zip
            && self.kind == other.kind
            && self.make_default == other.make_default
    }
}

impl Eq for NewAddress {}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(street: &str, country: &str, zip: &str, set_default: bool) -> NewAddressFields {
        NewAddressFields {
            street_address: street.to_owned(),
            apartment_address: "Apt 2".to_owned(),
            country: country.to_owned(),
            zip: zip.to_owned(),
            set_default,
        }
    }

    #[test]
    fn test_use_default_with_existing_default() {
        let outcome = resolve_slot(
            AddressKind::Shipping,
            &AddressChoice::UseDefault,
            Some(AddressId::new(7)),
        );
        assert_eq!(outcome, SlotOutcome::Attach(AddressId::new(7)));
    }

    #[test]
    fn test_use_default_without_default_aborts() {
        // No address row is created and the slot stays unset.
        let outcome = resolve_slot(AddressKind::Shipping, &AddressChoice::UseDefault, None);
        assert_eq!(outcome, SlotOutcome::MissingDefault);
    }

    #[test]
    fn test_new_address_valid() {
        let outcome = resolve_slot(
            AddressKind::Billing,
            &AddressChoice::New(fields("1 Main St", "US", "90210", true)),
            None,
        );
        match outcome {
            SlotOutcome::Create(new) => {
                assert_eq!(new.kind, AddressKind::Billing);
                assert!(new.make_default);
                assert_eq!(new.street_address, "1 Main St");
            }
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn test_new_address_missing_required_field() {
        for bad in [
            fields("", "US", "90210", false),
            fields("1 Main St", "", "90210", false),
            fields("1 Main St", "US", "  ", false),
        ] {
            let outcome = resolve_slot(AddressKind::Shipping, &AddressChoice::New(bad), None);
            assert_eq!(outcome, SlotOutcome::Incomplete);
        }
    }

    #[test]
    fn test_apartment_is_optional() {
        let mut f = fields("1 Main St", "US", "90210", false);
        f.apartment_address = String::new();
        let outcome = resolve_slot(AddressKind::Shipping, &AddressChoice::New(f), None);
        assert!(matches!(outcome, SlotOutcome::Create(_)));
    }

    #[test]
    fn test_payment_option_parse() {
        assert_eq!(PaymentOption::parse("stripe"), Some(PaymentOption::Stripe));
        assert_eq!(PaymentOption::parse("paypal"), None);
        assert_eq!(PaymentOption::parse(""), None);
    }
}
