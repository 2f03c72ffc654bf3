use std::{sync::Arc, time::Duration};

use anyhow::Context;
use poem::{Server, listener::TcpListener};
use tokio::main;
use tokio_util::sync::CancellationToken;

use email_dispatch::{
    application::{
        handlers::delivery_worker::{DeliveryWorker, DeliveryWorkerConfig},
        services::{delivery_queue::DeliveryQueue, transport::MailTransport},
        usecases::{
            get_email::GetEmailUseCase, list_emails::ListEmailsUseCase,
            requeue_pending::RequeuePendingUseCase, submit_email::SubmitEmailUseCase,
        },
    },
    config::Config,
    domain::repositories::EmailRepository,
    infrastructure::{
        repositories::{
            in_memory::InMemoryEmailRepository,
            postgres::{self, PostgresEmailRepository},
        },
        transport::smtp::SmtpMailTransport,
    },
    logging,
    presentation::http::endpoints::root::{ApiState, build_app},
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_parse()?;
    logging::init(&config.log_level);

    let repo: Arc<dyn EmailRepository> = match &config.database_url {
        Some(url) => {
            let pool = postgres::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to database")?;
            tracing::info!("using postgres email store");
            PostgresEmailRepository::new(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, emails are kept in memory only");
            Arc::new(InMemoryEmailRepository::new())
        }
    };
    let transport: Arc<dyn MailTransport> = Arc::new(
        SmtpMailTransport::new(&config.smtp).context("invalid smtp settings")?,
    );
    let queue = Arc::new(DeliveryQueue::new(config.queue_capacity));
    let shutdown = CancellationToken::new();

    let worker = DeliveryWorker::new(
        repo.clone(),
        transport,
        queue.clone(),
        DeliveryWorkerConfig {
            max_retries: config.max_retries,
            error_cooldown: config.worker_error_cooldown,
        },
    )
    .spawn(shutdown.clone());

    // snapshot before the api accepts submissions
    let backlog = RequeuePendingUseCase::new(repo.clone(), queue.clone())
        .load()
        .await
        .context("failed to load pending emails")?;
    tracing::info!(pending = backlog.len(), "loaded pending emails from store");
    let recovery = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = backlog.enqueue(&shutdown).await {
                tracing::error!(error = %err, "failed to requeue pending emails");
            }
        })
    };

    let state = Arc::new(ApiState {
        submit_email_usecase: Arc::new(SubmitEmailUseCase::new(repo.clone(), queue.clone())),
        get_email_usecase: Arc::new(GetEmailUseCase::new(repo.clone())),
        list_emails_usecase: Arc::new(ListEmailsUseCase::new(repo)),
        api_key: config.api_key.clone(),
    });

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);
    let app = build_app(state, &server_url);
    tracing::info!(%server_url, "starting email api");

    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let served = Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run_with_graceful_shutdown(app, shutdown.clone().cancelled_owned(), Some(SHUTDOWN_GRACE))
        .await;

    // the server can also stop on its own (bind failure), so stop the worker too
    shutdown.cancel();
    let _ = recovery.await;
    if let Err(err) = worker.await {
        tracing::error!(error = %err, "delivery worker task panicked");
    }
    tracing::info!("email api stopped");

    served.context("http server failed")
}

async fn shutdown_on_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate => {}
        _ = shutdown.cancelled() => return,
    }
    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
