//! Work-order service — role-gated listing, edit, and delete.
//!
//! DESIGN
//! ======
//! Persistence sits behind `WorkOrderSource`. `MockWorkOrders` serves the
//! fixture set the dashboard ships with until a real backend exists. Role
//! checks happen here, not in the source: everyone may view, only admins
//! may edit or delete, and delete needs an explicit confirmation.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::notify::{Notification, Notifier};
use crate::provider::types::Role;

pub const LIST_TITLE: &str = "Órdenes de Trabajo Recientes";
pub const DELETE_CONFIRM_PROMPT: &str = "¿Está seguro que desea eliminar esta orden de trabajo?";
pub const DELETED_TITLE: &str = "Orden eliminada";
pub const DELETED_DESCRIPTION: &str = "La orden de trabajo ha sido eliminada exitosamente";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    InProgress,
    Pending,
    Review,
}

/// Visual weight of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeVariant {
    Default,
    Secondary,
    Outline,
}

impl WorkOrderStatus {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "En Progreso",
            Self::Pending => "Pendiente",
            Self::Review => "Revisión",
        }
    }

    #[must_use]
    pub fn badge(self) -> BadgeVariant {
        match self {
            Self::InProgress => BadgeVariant::Default,
            Self::Pending => BadgeVariant::Secondary,
            Self::Review => BadgeVariant::Outline,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub customer: String,
    pub status: WorkOrderStatus,
    pub work_title: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    View,
    Edit,
    Delete,
}

impl RowAction {
    /// Actions a role may take on a row.
    #[must_use]
    pub fn allowed_for(role: Role) -> &'static [Self] {
        match role {
            Role::Admin => &[Self::View, Self::Edit, Self::Delete],
            Role::Member => &[Self::View],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOrderRow {
    pub order: WorkOrder,
    pub actions: &'static [RowAction],
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkOrderError {
    #[error("admin role required")]
    Forbidden,
    #[error("work order not found: {0}")]
    NotFound(String),
}

// =============================================================================
// SOURCE
// =============================================================================

#[async_trait::async_trait]
pub trait WorkOrderSource: Send + Sync {
    async fn list(&self) -> Vec<WorkOrder>;

    /// # Errors
    ///
    /// `NotFound` if no order has `id`.
    async fn delete(&self, id: &str) -> Result<(), WorkOrderError>;
}

/// In-memory fixture set.
pub struct MockWorkOrders {
    orders: Mutex<Vec<WorkOrder>>,
}

impl MockWorkOrders {
    #[must_use]
    pub fn new() -> Self {
        Self { orders: Mutex::new(fixtures()) }
    }
}

impl Default for MockWorkOrders {
    fn default() -> Self {
        Self::new()
    }
}

fn fixture(id: &str, customer: &str, status: WorkOrderStatus, work_title: &str, priority: Priority) -> WorkOrder {
    WorkOrder { id: id.into(), customer: customer.into(), status, work_title: work_title.into(), priority }
}

fn fixtures() -> Vec<WorkOrder> {
    vec![
        fixture("WO-001", "Cliente A", WorkOrderStatus::InProgress, "Obra Test 1", Priority::High),
        fixture("WO-002", "Cliente B", WorkOrderStatus::Pending, "Obra Test 2", Priority::Medium),
        fixture("WO-003", "Cliente C", WorkOrderStatus::Review, "Obra Test 3", Priority::Low),
    ]
}

#[async_trait::async_trait]
impl WorkOrderSource for MockWorkOrders {
    async fn list(&self) -> Vec<WorkOrder> {
        self.orders.lock().clone()
    }

    async fn delete(&self, id: &str) -> Result<(), WorkOrderError> {
        let mut orders = self.orders.lock();
        let before = orders.len();
        orders.retain(|o| o.id != id);
        if orders.len() == before {
            return Err(WorkOrderError::NotFound(id.to_owned()));
        }
        info!(work_order_id = %id, "mock work order deleted");
        Ok(())
    }
}

// =============================================================================
// LIST
// =============================================================================

pub struct WorkOrderList {
    source: Arc<dyn WorkOrderSource>,
    notifier: Arc<dyn Notifier>,
}

impl WorkOrderList {
    pub fn new(source: Arc<dyn WorkOrderSource>, notifier: Arc<dyn Notifier>) -> Self {
        Self { source, notifier }
    }

    pub async fn rows(&self, role: Role) -> Vec<WorkOrderRow> {
        let actions = RowAction::allowed_for(role);
        self.source.list().await.into_iter().map(|order| WorkOrderRow { order, actions }).collect()
    }

    /// Open an order for editing.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `NotFound` for an unknown id.
    pub async fn edit(&self, role: Role, id: &str) -> Result<WorkOrder, WorkOrderError> {
        require_admin(role)?;
        let order = self
            .source
            .list()
            .await
            .into_iter()
            .find(|o| o.id == id)
            .ok_or_else(|| WorkOrderError::NotFound(id.to_owned()))?;
        info!(work_order_id = %id, "edit requested");
        Ok(order)
    }

    /// Delete an order. Returns `Ok(false)` without touching the source when
    /// the user did not confirm.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admins, `NotFound` for an unknown id.
    pub async fn delete(&self, role: Role, id: &str, confirmed: bool) -> Result<bool, WorkOrderError> {
        require_admin(role)?;
        if !confirmed {
            return Ok(false);
        }
        self.source.delete(id).await?;
        self.notifier.show(Notification::info(DELETED_TITLE, DELETED_DESCRIPTION));
        Ok(true)
    }
}

fn require_admin(role: Role) -> Result<(), WorkOrderError> {
    match role {
        Role::Admin => Ok(()),
        Role::Member => Err(WorkOrderError::Forbidden),
    }
}

#[cfg(test)]
#[path = "work_orders_test.rs"]
mod tests;
