//! サービスレジストリ
//!
//! 監視対象サービスの登録・更新・削除。SQLiteを唯一の状態として扱い、
//! 書き込み確定後にフックを呼ぶ。

use chrono::Utc;
use control_interface_common::error::ControlError;
use control_interface_common::protocol::{CreateServiceRequest, UpdateServiceRequest};
use control_interface_common::types::Service;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::services as db;
use crate::hooks::{HookEvent, SharedHook};

/// サービスレジストリ
#[derive(Clone)]
pub struct ServiceRegistry {
    pool: SqlitePool,
    hook: SharedHook,
}

impl ServiceRegistry {
    /// 新しいレジストリを作成
    pub fn new(pool: SqlitePool, hook: SharedHook) -> Self {
        Self { pool, hook }
    }

    /// サービスを登録
    ///
    /// `up` は常にfalseで開始する。
    pub async fn register(
        &self,
        req: CreateServiceRequest,
        created_by: Option<Uuid>,
    ) -> Result<Service, ControlError> {
        req.validate()?;

        let service = Service::new(req.name, req.url, req.token, created_by);
        db::create_service(&self.pool, &service).await?;

        info!(
            service_id = %service.id,
            service_name = %service.name,
            "Service registered"
        );

        self.hook
            .after_write(HookEvent::ServiceAdded(service.clone()))
            .await;
        Ok(service)
    }

    /// サービスを更新（name/url/tokenのみ）
    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateServiceRequest,
        updated_by: Option<Uuid>,
    ) -> Result<Service, ControlError> {
        req.validate()?;

        let mut service = self.get(id).await?;
        service.name = req.name;
        service.url = req.url;
        service.token = req.token;
        service.updated_by = updated_by;
        service.updated_at = Utc::now();

        if !db::update_service(&self.pool, &service).await? {
            return Err(ControlError::ServiceNotFound(id));
        }

        info!(
            service_id = %service.id,
            service_name = %service.name,
            "Service updated"
        );

        // 更新中にポーリングが `up` を書き換えている可能性があるため読み直す
        let service = self.get(id).await?;
        self.hook
            .after_write(HookEvent::ServiceChanged(service.clone()))
            .await;
        Ok(service)
    }

    /// サービスを取得
    pub async fn get(&self, id: Uuid) -> Result<Service, ControlError> {
        db::get_service(&self.pool, id)
            .await?
            .ok_or(ControlError::ServiceNotFound(id))
    }

    /// すべてのサービスを取得（登録順）
    pub async fn list(&self) -> Result<Vec<Service>, ControlError> {
        db::list_services(&self.pool).await
    }

    /// サービスをページ単位で取得
    pub async fn list_page(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Service>, u64), ControlError> {
        db::list_services_page(&self.pool, page, per_page).await
    }

    /// サービスを削除
    pub async fn delete(&self, id: Uuid) -> Result<(), ControlError> {
        if !db::delete_service(&self.pool, id).await? {
            return Err(ControlError::ServiceNotFound(id));
        }
        info!(service_id = %id, "Service deleted");
        Ok(())
    }
}
