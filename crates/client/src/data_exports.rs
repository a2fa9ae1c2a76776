//! `data_exports` endpoints of the MDM API.

use tracing::info;

use domain::models::ExportJob;
use domain::services::{CreateExportRequest, DownloadTarget, DownloadedExport, ExportGateway};
use domain::GatewayError;
use shared::TenantCrn;

use crate::config::MdmClientConfig;
use crate::download;
use crate::transport::Transport;

const DATA_EXPORTS_PATH: &str = "data_exports";

/// reqwest-backed [`ExportGateway`].
#[derive(Debug, Clone)]
pub struct DataExportClient {
    transport: Transport,
}

impl DataExportClient {
    pub fn new(config: MdmClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            transport: Transport::new(config)?,
        })
    }

    pub fn from_transport(transport: Transport) -> Self {
        Self { transport }
    }
}

#[async_trait::async_trait]
impl ExportGateway for DataExportClient {
    async fn create_export(
        &self,
        crn: &TenantCrn,
        request: &CreateExportRequest,
    ) -> Result<ExportJob, GatewayError> {
        let query = request.query_params();
        info!(
            tenant_id = %crn.tenant_id(),
            export_type = %request.body.export_type,
            format = %request.body.format,
            compression = %request.compression,
            "Creating data export job"
        );

        let job: ExportJob = self
            .transport
            .post_json(DATA_EXPORTS_PATH, crn, &request.body, &query)
            .await?;

        info!(tenant_id = %crn.tenant_id(), export_id = %job.job_id, status = %job.status, "Data export job created");
        Ok(job)
    }

    async fn get_export(
        &self,
        crn: &TenantCrn,
        export_id: &str,
    ) -> Result<ExportJob, GatewayError> {
        info!(tenant_id = %crn.tenant_id(), export_id = %export_id, "Getting data export job");
        self.transport
            .get_json(&format!("{}/{}", DATA_EXPORTS_PATH, export_id), crn, &[])
            .await
    }

    async fn download_export(
        &self,
        crn: &TenantCrn,
        export_id: &str,
        target: DownloadTarget,
    ) -> Result<DownloadedExport, GatewayError> {
        info!(tenant_id = %crn.tenant_id(), export_id = %export_id, "Downloading data export file");
        let response = self
            .transport
            .open_download(
                &format!("{}/{}/download", DATA_EXPORTS_PATH, export_id),
                crn,
                &[],
            )
            .await?;

        download::materialize(response, export_id, target).await
    }
}
