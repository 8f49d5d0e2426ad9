//! Course-update notifications over the mail gateway's HTTP API.

use std::sync::Arc;

use accounts::contract::client::AccountsApi;
use anyhow::{bail, Context};
use async_trait::async_trait;
use modkit::TracedClient;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::contract::model::Course;
use crate::domain::ports::CourseNotifier;

const SEND_PATH: &str = "api/send";
const BODY: &str = "Произошло обновление курса";

/// Request body of `POST /api/send`.
#[derive(Debug, Serialize)]
struct SendMail<'a> {
    subject: String,
    body: &'a str,
    from: &'a str,
    to: Vec<String>,
}

pub struct HttpMailNotifier {
    client: TracedClient,
    endpoint: Url,
    from: String,
    accounts: Arc<dyn AccountsApi>,
}

impl HttpMailNotifier {
    /// `base` is the gateway root, e.g. `http://mail.local:8025`.
    pub fn new(
        client: TracedClient,
        base: &Url,
        from: impl Into<String>,
        accounts: Arc<dyn AccountsApi>,
    ) -> anyhow::Result<Self> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(SEND_PATH)
            .with_context(|| format!("invalid mail gateway url '{base}'"))?;
        Ok(Self {
            client,
            endpoint,
            from: from.into(),
            accounts,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub fn subject_for(course: &Course) -> String {
    format!("Обновление курса {}", course.title)
}

#[async_trait]
impl CourseNotifier for HttpMailNotifier {
    #[instrument(name = "courses.mail.course_updated", skip_all, fields(course_id = course.id, subscribers = subscriber_ids.len()))]
    async fn course_updated(&self, course: &Course, subscriber_ids: &[i64]) -> anyhow::Result<()> {
        if subscriber_ids.is_empty() {
            return Ok(());
        }
        let to = self
            .accounts
            .emails_for(subscriber_ids)
            .await
            .context("resolve subscriber emails")?;
        if to.is_empty() {
            debug!("No deliverable addresses");
            return Ok(());
        }

        let mail = SendMail {
            subject: subject_for(course),
            body: BODY,
            from: &self.from,
            to,
        };
        let resp = self
            .client
            .post_json(self.endpoint.as_str(), &mail)
            .await
            .context("mail gateway request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("mail gateway answered {status}");
        }
        debug!(recipients = mail.to.len(), "Mail accepted by gateway");
        Ok(())
    }
}
