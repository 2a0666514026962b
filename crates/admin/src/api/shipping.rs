//! Shipping endpoints (`admin/shipping/...`).

use async_trait::async_trait;
use reqwest::Method;
use tracing::instrument;

use segishop_core::catalog::ProductSummary;
use segishop_core::shipping::{
    ClassCost, ClassCostUpdate, ClassInput, MethodInput, NewClassCost, NewZoneMethod,
    RegionInput, ShippingClass, ShippingMethod, ShippingOverview, ShippingZone, ZoneInput,
};
use segishop_core::types::{
    ClassCostId, ClassId, MethodId, Page, PageRequest, ProductId, RegionId, ZoneId,
};

use super::types::{
    Ack, ClassPayload, ClassProductsPayload, ClassesPayload, CostsPayload, CreatedCost,
    MethodPayload, MethodsPayload, ProductIds, ZonePayload, ZonesPayload,
};
use super::{ApiError, SegishopClient};

/// Everything the admin console does with shipping configuration.
#[async_trait]
pub trait ShippingApi: Send + Sync {
    async fn overview(&self) -> Result<ShippingOverview, ApiError>;

    // Zones
    async fn list_zones(&self) -> Result<Vec<ShippingZone>, ApiError>;
    async fn get_zone(&self, id: ZoneId) -> Result<ShippingZone, ApiError>;
    async fn create_zone(&self, input: &ZoneInput) -> Result<ShippingZone, ApiError>;
    async fn update_zone(&self, id: ZoneId, input: &ZoneInput) -> Result<ShippingZone, ApiError>;
    async fn delete_zone(&self, id: ZoneId) -> Result<Ack, ApiError>;
    async fn add_region(&self, zone_id: ZoneId, input: &RegionInput) -> Result<Ack, ApiError>;
    async fn remove_region(&self, zone_id: ZoneId, region_id: RegionId) -> Result<Ack, ApiError>;

    /// Create the join row between a zone and a method.
    async fn create_zone_method(&self, input: &NewZoneMethod) -> Result<Ack, ApiError>;
    /// Delete the join row for `method_id` in `zone_id`.
    async fn remove_zone_method(&self, zone_id: ZoneId, method_id: MethodId)
    -> Result<Ack, ApiError>;

    // Methods
    async fn list_methods(&self) -> Result<Vec<ShippingMethod>, ApiError>;
    async fn get_method(&self, id: MethodId) -> Result<ShippingMethod, ApiError>;
    async fn create_method(&self, input: &MethodInput) -> Result<ShippingMethod, ApiError>;
    async fn update_method(
        &self,
        id: MethodId,
        input: &MethodInput,
    ) -> Result<ShippingMethod, ApiError>;
    async fn delete_method(&self, id: MethodId) -> Result<Ack, ApiError>;

    // Classes
    async fn list_classes(&self) -> Result<Vec<ShippingClass>, ApiError>;
    async fn get_class(&self, id: ClassId) -> Result<ShippingClass, ApiError>;
    async fn create_class(&self, input: &ClassInput) -> Result<ShippingClass, ApiError>;
    async fn update_class(&self, id: ClassId, input: &ClassInput)
    -> Result<ShippingClass, ApiError>;
    async fn delete_class(&self, id: ClassId) -> Result<Ack, ApiError>;

    // Class costs
    async fn list_class_costs(
        &self,
        class_id: Option<ClassId>,
        zone_id: Option<ZoneId>,
    ) -> Result<Vec<ClassCost>, ApiError>;
    async fn create_class_cost(&self, input: &NewClassCost) -> Result<Option<ClassCostId>, ApiError>;
    /// Only cost and cost type travel; the key is fixed at creation.
    async fn update_class_cost(
        &self,
        id: ClassCostId,
        update: &ClassCostUpdate,
    ) -> Result<Ack, ApiError>;
    async fn delete_class_cost(&self, id: ClassCostId) -> Result<Ack, ApiError>;

    // Product assignment
    async fn class_products(
        &self,
        class_id: ClassId,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Page<ProductSummary>, ApiError>;
    async fn unassigned_products(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Page<ProductSummary>, ApiError>;
    async fn assign_products(
        &self,
        class_id: ClassId,
        product_ids: &[ProductId],
    ) -> Result<Ack, ApiError>;
    async fn remove_products(
        &self,
        class_id: ClassId,
        product_ids: &[ProductId],
    ) -> Result<Ack, ApiError>;
}

fn missing(what: &str) -> ApiError {
    ApiError::Parse(format!("response carried no {what}"))
}

fn paging(page: PageRequest, search: Option<&str>) -> [(&'static str, String); 3] {
    [
        ("page", page.page.to_string()),
        ("pageSize", page.page_size.to_string()),
        ("search", search.map(str::trim).unwrap_or_default().to_string()),
    ]
}

#[async_trait]
impl ShippingApi for SegishopClient {
    #[instrument(skip(self))]
    async fn overview(&self) -> Result<ShippingOverview, ApiError> {
        self.get("admin/shipping/overview", &[]).await
    }

    #[instrument(skip(self))]
    async fn list_zones(&self) -> Result<Vec<ShippingZone>, ApiError> {
        let payload: ZonesPayload = self.get("admin/shipping/zones", &[]).await?;
        Ok(payload.zones)
    }

    #[instrument(skip(self), fields(zone_id = %id))]
    async fn get_zone(&self, id: ZoneId) -> Result<ShippingZone, ApiError> {
        let payload: ZonePayload = self.get(&format!("admin/shipping/zones/{id}"), &[]).await?;
        payload
            .zone
            .ok_or_else(|| ApiError::NotFound("Shipping zone not found".to_string()))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_zone(&self, input: &ZoneInput) -> Result<ShippingZone, ApiError> {
        let payload: ZonePayload = self
            .send_json(Method::POST, "admin/shipping/zones", input)
            .await?;
        payload.zone.ok_or_else(|| missing("zone"))
    }

    #[instrument(skip(self, input), fields(zone_id = %id))]
    async fn update_zone(&self, id: ZoneId, input: &ZoneInput) -> Result<ShippingZone, ApiError> {
        let payload: ZonePayload = self
            .send_json(Method::PUT, &format!("admin/shipping/zones/{id}"), input)
            .await?;
        payload.zone.ok_or_else(|| missing("zone"))
    }

    #[instrument(skip(self), fields(zone_id = %id))]
    async fn delete_zone(&self, id: ZoneId) -> Result<Ack, ApiError> {
        self.delete(&format!("admin/shipping/zones/{id}")).await
    }

    #[instrument(skip(self, input), fields(zone_id = %zone_id, code = %input.region_code))]
    async fn add_region(&self, zone_id: ZoneId, input: &RegionInput) -> Result<Ack, ApiError> {
        self.send_json(
            Method::POST,
            &format!("admin/shipping/zones/{zone_id}/regions"),
            input,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn remove_region(&self, zone_id: ZoneId, region_id: RegionId) -> Result<Ack, ApiError> {
        self.delete(&format!("admin/shipping/zones/{zone_id}/regions/{region_id}"))
            .await
    }

    #[instrument(skip(self, input), fields(zone_id = %input.shipping_zone_id, method_id = %input.shipping_method_id))]
    async fn create_zone_method(&self, input: &NewZoneMethod) -> Result<Ack, ApiError> {
        self.send_json(
            Method::POST,
            &format!("admin/shipping/zones/{}/methods", input.shipping_zone_id),
            input,
        )
        .await
    }

    #[instrument(skip(self))]
    async fn remove_zone_method(
        &self,
        zone_id: ZoneId,
        method_id: MethodId,
    ) -> Result<Ack, ApiError> {
        self.delete(&format!("admin/shipping/zones/{zone_id}/methods/{method_id}"))
            .await
    }

    #[instrument(skip(self))]
    async fn list_methods(&self) -> Result<Vec<ShippingMethod>, ApiError> {
        let payload: MethodsPayload = self.get("admin/shipping/methods", &[]).await?;
        Ok(payload.methods)
    }

    #[instrument(skip(self), fields(method_id = %id))]
    async fn get_method(&self, id: MethodId) -> Result<ShippingMethod, ApiError> {
        let payload: MethodPayload = self
            .get(&format!("admin/shipping/methods/{id}"), &[])
            .await?;
        payload
            .method
            .ok_or_else(|| ApiError::NotFound("Shipping method not found".to_string()))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_method(&self, input: &MethodInput) -> Result<ShippingMethod, ApiError> {
        let payload: MethodPayload = self
            .send_json(Method::POST, "admin/shipping/methods", input)
            .await?;
        payload.method.ok_or_else(|| missing("method"))
    }

    #[instrument(skip(self, input), fields(method_id = %id))]
    async fn update_method(
        &self,
        id: MethodId,
        input: &MethodInput,
    ) -> Result<ShippingMethod, ApiError> {
        let payload: MethodPayload = self
            .send_json(Method::PUT, &format!("admin/shipping/methods/{id}"), input)
            .await?;
        payload.method.ok_or_else(|| missing("method"))
    }

    #[instrument(skip(self), fields(method_id = %id))]
    async fn delete_method(&self, id: MethodId) -> Result<Ack, ApiError> {
        self.delete(&format!("admin/shipping/methods/{id}")).await
    }

    #[instrument(skip(self))]
    async fn list_classes(&self) -> Result<Vec<ShippingClass>, ApiError> {
        let payload: ClassesPayload = self.get("admin/shipping/classes", &[]).await?;
        Ok(payload.classes)
    }

    #[instrument(skip(self), fields(class_id = %id))]
    async fn get_class(&self, id: ClassId) -> Result<ShippingClass, ApiError> {
        let payload: ClassPayload = self
            .get(&format!("admin/shipping/classes/{id}"), &[])
            .await?;
        payload
            .class
            .ok_or_else(|| ApiError::NotFound("Shipping class not found".to_string()))
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    async fn create_class(&self, input: &ClassInput) -> Result<ShippingClass, ApiError> {
        let payload: ClassPayload = self
            .send_json(Method::POST, "admin/shipping/classes", input)
            .await?;
        payload.class.ok_or_else(|| missing("class"))
    }

    #[instrument(skip(self, input), fields(class_id = %id))]
    async fn update_class(
        &self,
        id: ClassId,
        input: &ClassInput,
    ) -> Result<ShippingClass, ApiError> {
        let payload: ClassPayload = self
            .send_json(Method::PUT, &format!("admin/shipping/classes/{id}"), input)
            .await?;
        payload.class.ok_or_else(|| missing("class"))
    }

    #[instrument(skip(self), fields(class_id = %id))]
    async fn delete_class(&self, id: ClassId) -> Result<Ack, ApiError> {
        self.delete(&format!("admin/shipping/classes/{id}")).await
    }

    #[instrument(skip(self))]
    async fn list_class_costs(
        &self,
        class_id: Option<ClassId>,
        zone_id: Option<ZoneId>,
    ) -> Result<Vec<ClassCost>, ApiError> {
        let query = [
            (
                "shippingClassId",
                class_id.map(|id| id.to_string()).unwrap_or_default(),
            ),
            (
                "shippingZoneId",
                zone_id.map(|id| id.to_string()).unwrap_or_default(),
            ),
        ];
        let payload: CostsPayload = self.get("admin/shipping/class-costs", &query).await?;
        Ok(payload.costs)
    }

    #[instrument(skip(self, input), fields(zone_method_id = %input.shipping_zone_method_id, class_id = %input.shipping_class_id))]
    async fn create_class_cost(
        &self,
        input: &NewClassCost,
    ) -> Result<Option<ClassCostId>, ApiError> {
        let created: CreatedCost = self
            .send_json(Method::POST, "admin/shipping/class-costs", input)
            .await?;
        Ok(created.id)
    }

    #[instrument(skip(self, update), fields(cost_id = %id))]
    async fn update_class_cost(
        &self,
        id: ClassCostId,
        update: &ClassCostUpdate,
    ) -> Result<Ack, ApiError> {
        self.send_json(
            Method::PUT,
            &format!("admin/shipping/class-costs/{id}"),
            update,
        )
        .await
    }

    #[instrument(skip(self), fields(cost_id = %id))]
    async fn delete_class_cost(&self, id: ClassCostId) -> Result<Ack, ApiError> {
        self.delete(&format!("admin/shipping/class-costs/{id}")).await
    }

    #[instrument(skip(self))]
    async fn class_products(
        &self,
        class_id: ClassId,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Page<ProductSummary>, ApiError> {
        let payload: ClassProductsPayload = self
            .get(
                &format!("admin/shipping/classes/{class_id}/products"),
                &paging(page, search),
            )
            .await?;
        Ok(payload.into_page(page))
    }

    #[instrument(skip(self))]
    async fn unassigned_products(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Page<ProductSummary>, ApiError> {
        let payload: ClassProductsPayload = self
            .get("admin/shipping/products/unassigned", &paging(page, search))
            .await?;
        Ok(payload.into_page(page))
    }

    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    async fn assign_products(
        &self,
        class_id: ClassId,
        product_ids: &[ProductId],
    ) -> Result<Ack, ApiError> {
        self.send_json(
            Method::POST,
            &format!("admin/shipping/classes/{class_id}/products"),
            &ProductIds { product_ids },
        )
        .await
    }

    #[instrument(skip(self, product_ids), fields(count = product_ids.len()))]
    async fn remove_products(
        &self,
        class_id: ClassId,
        product_ids: &[ProductId],
    ) -> Result<Ack, ApiError> {
        self.send_json(
            Method::DELETE,
            &format!("admin/shipping/classes/{class_id}/products"),
            &ProductIds { product_ids },
        )
        .await
    }
}
