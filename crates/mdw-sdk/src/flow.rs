//! Typed session over a storage [`WriteFlow`].
//!
//! Each step consumes the previous session value and returns the next, so
//! the artifact a step depends on (the register digest for upload, for
//! instance) is carried explicitly and steps cannot run out of order.

use std::time::Duration;

use mdw_types::SaveStage;
use tracing::debug;

use crate::error::ExternalError;
use crate::ports::{RegisterParams, TransactionDigest, WalletSigner, WriteFlow};

/// Why one attempt at the write protocol failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepFailure {
    /// A collaborator reported an error.
    External(ExternalError),
    /// Upload did not finish within its budget.
    UploadTimeout(Duration),
}

impl std::fmt::Display for StepFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::External(e) => write!(f, "{e}"),
            Self::UploadTimeout(d) => write!(f, "upload timeout after {d:?}"),
        }
    }
}

/// A step failure and the stage it happened in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptError {
    pub stage: SaveStage,
    pub failure: StepFailure,
}

impl AttemptError {
    fn external(stage: SaveStage, error: ExternalError) -> Self {
        Self {
            stage,
            failure: StepFailure::External(error),
        }
    }
}

/// A flow with no steps run.
pub struct FreshSession {
    flow: Box<dyn WriteFlow>,
}

/// Encoded, ready to register.
pub struct EncodedSession {
    flow: Box<dyn WriteFlow>,
}

/// Registered on chain; holds the register digest.
pub struct RegisteredSession {
    flow: Box<dyn WriteFlow>,
    register_digest: TransactionDigest,
}

/// Shards uploaded, ready to certify.
pub struct UploadedSession {
    flow: Box<dyn WriteFlow>,
    register_digest: TransactionDigest,
}

/// Certified on chain. Only the written file list remains.
pub struct CertifiedSession {
    flow: Box<dyn WriteFlow>,
    register_digest: TransactionDigest,
    certify_digest: TransactionDigest,
}

/// Result of a finished write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    pub blob_id: String,
    pub register_digest: TransactionDigest,
    pub certify_digest: TransactionDigest,
}

impl FreshSession {
    /// Start a session over a fresh flow.
    pub fn new(flow: Box<dyn WriteFlow>) -> Self {
        Self { flow }
    }

    /// Encode the file into shards.
    pub async fn encode(mut self) -> Result<EncodedSession, AttemptError> {
        self.flow
            .encode()
            .await
            .map_err(|e| AttemptError::external(SaveStage::Encoding, e))?;
        Ok(EncodedSession { flow: self.flow })
    }
}

impl EncodedSession {
    /// Build the register transaction and have the wallet execute it.
    pub async fn register(
        mut self,
        params: &RegisterParams,
        wallet: &dyn WalletSigner,
    ) -> Result<RegisteredSession, AttemptError> {
        let fail = |e| AttemptError::external(SaveStage::Registering, e);
        let tx = self.flow.register(params).map_err(fail)?;
        let register_digest = wallet.sign_and_execute(tx).await.map_err(fail)?;
        debug!(digest = %register_digest, "register transaction executed");
        Ok(RegisteredSession {
            flow: self.flow,
            register_digest,
        })
    }
}

impl RegisteredSession {
    /// Digest of the executed register transaction.
    pub fn register_digest(&self) -> &TransactionDigest {
        &self.register_digest
    }

    /// Upload shards, racing the upload against `budget`.
    pub async fn upload(mut self, budget: Duration) -> Result<UploadedSession, AttemptError> {
        match tokio::time::timeout(budget, self.flow.upload(&self.register_digest)).await {
            Ok(Ok(())) => Ok(UploadedSession {
                flow: self.flow,
                register_digest: self.register_digest,
            }),
            Ok(Err(e)) => Err(AttemptError::external(SaveStage::Uploading, e)),
            Err(_) => Err(AttemptError {
                stage: SaveStage::Uploading,
                failure: StepFailure::UploadTimeout(budget),
            }),
        }
    }
}

impl UploadedSession {
    /// Build the certify transaction and have the wallet execute it.
    pub async fn certify(mut self, wallet: &dyn WalletSigner) -> Result<CertifiedSession, AttemptError> {
        let fail = |e| AttemptError::external(SaveStage::Certifying, e);
        let tx = self.flow.certify().map_err(fail)?;
        let certify_digest = wallet.sign_and_execute(tx).await.map_err(fail)?;
        debug!(digest = %certify_digest, "certify transaction executed");
        Ok(CertifiedSession {
            flow: self.flow,
            register_digest: self.register_digest,
            certify_digest,
        })
    }
}

impl CertifiedSession {
    /// The first written file's blob id is the canonical result.
    pub async fn finish(mut self) -> Result<WriteOutcome, AttemptError> {
        let fail = |e| AttemptError::external(SaveStage::Certifying, e);
        let files = self.flow.list_files().await.map_err(fail)?;
        let blob_id = files
            .into_iter()
            .map(|f| f.blob_id)
            .find(|id| !id.is_empty())
            .ok_or_else(|| fail(ExternalError::new("storage flow reported no written files")))?;
        Ok(WriteOutcome {
            blob_id,
            register_digest: self.register_digest,
            certify_digest: self.certify_digest,
        })
    }
}
