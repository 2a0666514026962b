//! Class cost create/edit flow.
//!
//! A cost row is keyed by (zone method, class). The key is picked once, on
//! create, through a zone select that narrows the zone-method select; after
//! that only the amount and its type can change.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use segishop_core::FieldErrors;
use segishop_core::shipping::{
    ClassCost, ClassCostUpdate, NewClassCost, ShippingClass, ShippingRuleError, ShippingZone,
    ZoneMethod, ensure_unique_cost_key,
};
use segishop_core::types::{ClassCostId, ClassId, CostType, ZoneId, ZoneMethodId};

use crate::api::{ApiError, ShippingApi};

/// Why a save did not go through.
#[derive(Debug, Error)]
pub enum CostFormError {
    #[error("{0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Rule(#[from] ShippingRuleError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CostFormError {
    /// Form-level message; field errors render inline instead.
    #[must_use]
    pub fn banner(&self) -> Option<String> {
        match self {
            Self::Invalid(_) => None,
            Self::Rule(e) => Some(e.to_string()),
            Self::Api(e) => Some(e.user_message()),
        }
    }
}

/// Raw form fields, as posted or carried in the query string while the
/// zone select cascades.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostFormInput {
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    /// Zone the method list was loaded for; a mismatch means the zone changed.
    #[serde(default)]
    pub loaded_zone_id: Option<ZoneId>,
    #[serde(default)]
    pub zone_method_id: Option<ZoneMethodId>,
    #[serde(default)]
    pub class_id: Option<ClassId>,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub cost_type: CostType,
}

impl CostFormInput {
    /// Drop the zone method when the zone changed since the methods were
    /// loaded, and unset ids of 0.
    #[must_use]
    pub fn normalized(self) -> Self {
        let zone_id = self.zone_id.filter(|id| id.is_set());
        let zone_method_id = if zone_id == self.loaded_zone_id.filter(|id| id.is_set()) {
            self.zone_method_id.filter(|id| id.is_set())
        } else {
            None
        };
        Self {
            zone_id,
            loaded_zone_id: zone_id,
            zone_method_id,
            class_id: self.class_id.filter(|id| id.is_set()),
            ..self
        }
    }

    fn parse_cost(&self, errors: &mut FieldErrors) -> Option<Decimal> {
        let raw = self.cost.trim();
        if raw.is_empty() {
            errors.add("cost", "Cost is required");
            return None;
        }
        match Decimal::from_str(raw) {
            Ok(cost) if cost.is_sign_negative() && !cost.is_zero() => {
                errors.add("cost", "Cost must be zero or more");
                None
            }
            Ok(cost) => Some(cost),
            Err(_) => {
                errors.add("cost", "Cost must be a number");
                None
            }
        }
    }

    /// Body for a new cost row.
    ///
    /// # Errors
    ///
    /// Returns field-keyed errors for a missing zone method, class or cost.
    pub fn validate_new(&self) -> Result<NewClassCost, FieldErrors> {
        let mut errors = FieldErrors::new();
        let zone_method_id = self.zone_method_id.filter(|id| id.is_set());
        if zone_method_id.is_none() {
            errors.add("zone_method_id", "Select a zone method");
        }
        let class_id = self.class_id.filter(|id| id.is_set());
        if class_id.is_none() {
            errors.add("class_id", "Select a shipping class");
        }
        let cost = self.parse_cost(&mut errors);
        match (zone_method_id, class_id, cost) {
            (Some(shipping_zone_method_id), Some(shipping_class_id), Some(cost))
                if errors.is_empty() =>
            {
                Ok(NewClassCost {
                    shipping_zone_method_id,
                    shipping_class_id,
                    cost,
                    cost_type: self.cost_type,
                })
            }
            _ => Err(errors),
        }
    }

    /// Body for an update. Key fields in the input are ignored.
    ///
    /// # Errors
    ///
    /// Returns field-keyed errors for a missing or negative cost.
    pub fn validate_update(&self) -> Result<ClassCostUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        match self.parse_cost(&mut errors) {
            Some(cost) => Ok(ClassCostUpdate {
                cost,
                cost_type: self.cost_type,
            }),
            None => Err(errors),
        }
    }

    /// Whether the save button is enabled.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.validate_new().is_ok()
    }
}

/// Everything the cost form page renders.
#[derive(Debug, Clone)]
pub struct CostForm {
    /// `Some` when editing; the key selects are then locked.
    pub existing: Option<ClassCost>,
    pub zones: Vec<ShippingZone>,
    pub classes: Vec<ShippingClass>,
    pub zone_methods: Vec<ZoneMethod>,
    pub input: CostFormInput,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl CostForm {
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        self.existing.is_some()
    }

    #[must_use]
    pub fn can_save(&self) -> bool {
        if self.is_edit() {
            self.input.validate_update().is_ok()
        } else {
            self.input.can_save()
        }
    }

    /// Attach the outcome of a failed save.
    #[must_use]
    pub fn with_error(mut self, error: &CostFormError) -> Self {
        if let CostFormError::Invalid(fields) = error {
            self.errors = fields.clone();
        }
        self.error = error.banner();
        self
    }
}

pub struct ClassCostFormService<'a> {
    api: &'a dyn ShippingApi,
}

impl<'a> ClassCostFormService<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn ShippingApi) -> Self {
        Self { api }
    }

    /// Build the create form. Zone methods are fetched only once a zone is
    /// chosen.
    ///
    /// # Errors
    ///
    /// Returns the API error if zones or classes cannot be loaded.
    pub async fn create_form(&self, input: CostFormInput) -> Result<CostForm, ApiError> {
        let input = input.normalized();
        let (zones, classes) = tokio::join!(self.api.list_zones(), self.api.list_classes());
        let zone_methods = match input.zone_id {
            Some(zone_id) => self.api.get_zone(zone_id).await?.methods,
            None => Vec::new(),
        };
        Ok(CostForm {
            existing: None,
            zones: zones?,
            classes: classes?,
            zone_methods,
            input,
            errors: FieldErrors::new(),
            error: None,
        })
    }

    /// Build the edit form for an existing cost, prefilled from it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if no cost has that id.
    pub async fn edit_form(&self, id: ClassCostId) -> Result<CostForm, ApiError> {
        let cost = self.find(id).await?;
        let input = CostFormInput {
            zone_id: None,
            loaded_zone_id: None,
            zone_method_id: Some(cost.shipping_zone_method_id),
            class_id: Some(cost.shipping_class_id),
            cost: cost.cost.normalize().to_string(),
            cost_type: cost.cost_type,
        };
        Ok(CostForm {
            existing: Some(cost),
            zones: Vec::new(),
            classes: Vec::new(),
            zone_methods: Vec::new(),
            input,
            errors: FieldErrors::new(),
            error: None,
        })
    }

    /// Look a cost up by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if no cost has that id.
    pub async fn find(&self, id: ClassCostId) -> Result<ClassCost, ApiError> {
        self.api
            .list_class_costs(None, None)
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ApiError::NotFound("Shipping class cost not found".to_string()))
    }

    /// Validate, check the key is free, then create.
    ///
    /// # Errors
    ///
    /// Returns field errors, a duplicate-key rule error, or the API error.
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: &CostFormInput) -> Result<Option<ClassCostId>, CostFormError> {
        let body = input.validate_new().map_err(CostFormError::Invalid)?;
        let existing = self
            .api
            .list_class_costs(Some(body.shipping_class_id), None)
            .await?;
        ensure_unique_cost_key(&existing, body.key())?;
        let id = self.api.create_class_cost(&body).await?;
        info!(
            zone_method_id = %body.shipping_zone_method_id,
            class_id = %body.shipping_class_id,
            "Shipping class cost created"
        );
        Ok(id)
    }

    /// Change amount and type of an existing cost.
    ///
    /// # Errors
    ///
    /// Returns field errors or the API error.
    #[instrument(skip(self, input), fields(cost_id = %id))]
    pub async fn update(&self, id: ClassCostId, input: &CostFormInput) -> Result<(), CostFormError> {
        let update = input.validate_update().map_err(CostFormError::Invalid)?;
        self.api.update_class_cost(id, &update).await?;
        info!(cost_id = %id, "Shipping class cost updated");
        Ok(())
    }
}
