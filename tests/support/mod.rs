//! Shared fakes for the delivery pipeline tests.
#![allow(dead_code)]

use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use email_dispatch::{
    application::{
        handlers::delivery_worker::{DeliveryWorker, DeliveryWorkerConfig},
        services::{
            delivery_queue::DeliveryQueue,
            transport::{DeliveryOutcome, MailTransport},
        },
        usecases::submit_email::{SubmitEmailRequest, SubmitEmailUseCase},
    },
    domain::{
        models::{EmailMessage, EmailStatus, NewEmail},
        repositories::EmailRepository,
    },
    infrastructure::repositories::in_memory::InMemoryEmailRepository,
};

/// Replays a fixed script of outcomes, then keeps returning the fallback.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<DeliveryOutcome>>,
    fallback: DeliveryOutcome,
    calls: AtomicU32,
}

impl ScriptedTransport {
    pub fn new(script: Vec<DeliveryOutcome>, fallback: DeliveryOutcome) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
        })
    }

    pub fn always_delivers() -> Arc<Self> {
        Self::new(Vec::new(), DeliveryOutcome::Delivered)
    }

    pub fn always_fails(reason: &str) -> Arc<Self> {
        Self::new(Vec::new(), DeliveryOutcome::failed(reason))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn send(&self, _email: &EmailMessage) -> DeliveryOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

/// Wraps the in-memory store, recording every persisted status per email and
/// optionally failing the first `get` calls.
#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryEmailRepository,
    history: Mutex<Vec<(Uuid, EmailStatus)>>,
    failing_gets: AtomicU32,
}

impl RecordingRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_first_gets(count: u32) -> Arc<Self> {
        let repo = Self::default();
        repo.failing_gets.store(count, Ordering::SeqCst);
        Arc::new(repo)
    }

    pub fn statuses(&self, id: Uuid) -> Vec<EmailStatus> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|(email_id, _)| *email_id == id)
            .map(|(_, status)| *status)
            .collect()
    }
}

#[async_trait]
impl EmailRepository for RecordingRepository {
    async fn insert(&self, email: NewEmail) -> anyhow::Result<EmailMessage> {
        let stored = self.inner.insert(email).await?;
        self.history.lock().unwrap().push((stored.id, stored.status));
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<EmailMessage>> {
        let remaining = self.failing_gets.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_gets.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("store unavailable");
        }
        self.inner.get(id).await
    }

    async fn update(&self, email: &EmailMessage) -> anyhow::Result<()> {
        self.inner.update(email).await?;
        self.history.lock().unwrap().push((email.id, email.status));
        Ok(())
    }

    async fn find_by_status(&self, status: EmailStatus) -> anyhow::Result<Vec<EmailMessage>> {
        self.inner.find_by_status(status).await
    }

    async fn list_all(&self) -> anyhow::Result<Vec<EmailMessage>> {
        self.inner.list_all().await
    }
}

pub struct Pipeline {
    pub repo: Arc<RecordingRepository>,
    pub transport: Arc<ScriptedTransport>,
    pub queue: Arc<DeliveryQueue>,
    pub submit: SubmitEmailUseCase,
    pub shutdown: CancellationToken,
    pub worker: Option<tokio::task::JoinHandle<()>>,
}

impl Pipeline {
    pub fn start(
        repo: Arc<RecordingRepository>,
        transport: Arc<ScriptedTransport>,
        max_retries: u32,
        capacity: usize,
    ) -> Self {
        let queue = Arc::new(DeliveryQueue::new(NonZeroUsize::new(capacity).unwrap()));
        let shutdown = CancellationToken::new();
        let worker = worker(repo.clone(), transport.clone(), queue.clone(), max_retries)
            .spawn(shutdown.clone());
        let submit = SubmitEmailUseCase::new(repo.clone(), queue.clone());

        Self {
            repo,
            transport,
            queue,
            submit,
            shutdown,
            worker: Some(worker),
        }
    }

    pub async fn submit(&self, subject: &str) -> Uuid {
        self.submit
            .execute(request(subject))
            .await
            .expect("submission should be accepted")
            .email_id
    }

    /// Polls the store until the email reaches a terminal status.
    pub async fn wait_terminal(&self, id: Uuid) -> EmailMessage {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(email) = self.repo.get(id).await.unwrap() {
                    if email.status.is_terminal() {
                        return email;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("email should reach a terminal status")
    }

    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(worker) = self.worker.take() {
            tokio::time::timeout(Duration::from_secs(1), worker)
                .await
                .expect("worker should stop after cancellation")
                .unwrap();
        }
    }
}

pub fn worker(
    repo: Arc<dyn EmailRepository>,
    transport: Arc<dyn MailTransport>,
    queue: Arc<DeliveryQueue>,
    max_retries: u32,
) -> DeliveryWorker {
    DeliveryWorker::new(
        repo,
        transport,
        queue,
        DeliveryWorkerConfig {
            max_retries,
            error_cooldown: Duration::from_millis(20),
        },
    )
}

pub fn request(subject: &str) -> SubmitEmailRequest {
    SubmitEmailRequest {
        to: "alice@example.com".to_string(),
        subject: subject.to_string(),
        body: "Hello".to_string(),
        is_html: false,
        cc: None,
        bcc: None,
    }
}
