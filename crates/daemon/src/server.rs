// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and request handling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use keel_core::{IdGen, NoDeploy, NotificationRequest, WatchMessage};
use keel_definition::PipelineDef;
use keel_engine::{
    cancel_latest_pipeline, derive_status, ClusterRegistry, CommandQueue, DeploymentLogs,
    EngineError, NotificationResults, PipelineRef, PipelineRuns, WaitPolicy, LATEST,
};
use keel_storage::DurableStore;
use thiserror::Error;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Watch intakes of the running reconcilers, by cluster name
pub type Intakes = HashMap<String, mpsc::Sender<WatchMessage>>;

/// Answers requests against the store and the running reconcilers.
///
/// Cheap to clone; every connection gets its own copy so a slow request
/// (awaiting a notification result) never holds up the accept loop.
#[derive(Clone)]
pub struct Handler<S, I> {
    clusters: ClusterRegistry<S>,
    queue: CommandQueue<S, I>,
    results: NotificationResults<S>,
    logs: DeploymentLogs<S>,
    runs: PipelineRuns<S>,
    definitions: Arc<HashMap<String, PipelineDef>>,
    intakes: Arc<Intakes>,
    start_time: Instant,
    shutdown: CancellationToken,
}

#[derive(Debug, Error)]
enum RequestError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("no reconciler for cluster {0}")]
    NoReconciler(String),
    #[error("reconciler for cluster {0} has stopped")]
    ReconcilerStopped(String),
}

impl RequestError {
    fn is_bad_request(&self) -> bool {
        match self {
            RequestError::Engine(e) => e.is_bad_request(),
            RequestError::NoReconciler(_) => true,
            RequestError::ReconcilerStopped(_) => false,
        }
    }
}

impl<S: DurableStore, I: IdGen> Handler<S, I> {
    pub fn new(
        store: S,
        id_gen: I,
        policy: WaitPolicy,
        definitions: HashMap<String, PipelineDef>,
        intakes: Intakes,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            clusters: ClusterRegistry::new(store.clone()),
            queue: CommandQueue::new(store.clone(), id_gen),
            results: NotificationResults::new(store.clone(), policy),
            logs: DeploymentLogs::new(store.clone()),
            runs: PipelineRuns::new(store),
            definitions: Arc::new(definitions),
            intakes: Arc::new(intakes),
            start_time: Instant::now(),
            shutdown,
        }
    }

    /// Handle a single request and return a response
    pub async fn handle(&self, request: Request) -> Response {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, bad_request = e.is_bad_request(), "request failed");
                Response::Error {
                    message: e.to_string(),
                    bad_request: e.is_bad_request(),
                }
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Response, RequestError> {
        let response = match request {
            Request::Ping => Response::Pong,

            Request::Hello { version: _ } => Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            },

            Request::Status => {
                let mut clusters: Vec<String> = self.intakes.keys().cloned().collect();
                clusters.sort();
                Response::Status {
                    uptime_secs: self.start_time.elapsed().as_secs(),
                    clusters,
                    pipelines: self.definitions.len(),
                }
            }

            Request::Shutdown => {
                self.shutdown.cancel();
                Response::ShuttingDown
            }

            Request::CreateCluster { org, cluster } => {
                self.clusters.create(&org, &cluster)?;
                Response::Ok
            }
            Request::GetCluster { org, cluster } => Response::Cluster {
                cluster: self.clusters.find(&org, &cluster)?,
            },
            Request::ListClusters { org } => Response::Clusters {
                clusters: self.clusters.list(&org)?,
            },
            Request::DeleteCluster { org, cluster } => {
                self.clusters.delete(&org, &cluster)?;
                Response::Ok
            }

            Request::SetNoDeploy {
                org,
                cluster,
                namespace,
                reason,
                requested_by,
            } => {
                let gate = NoDeploy::for_scope(namespace.as_deref(), reason, requested_by);
                self.clusters.set_no_deploy(&org, &cluster, gate)?;
                self.mark_no_deploy(&org, &cluster, namespace, true).await?
            }
            Request::ClearNoDeploy {
                org,
                cluster,
                namespace,
            } => {
                self.clusters.clear_no_deploy(&org, &cluster)?;
                self.mark_no_deploy(&org, &cluster, namespace, false).await?
            }

            Request::EnqueueCommand {
                org,
                cluster,
                packet,
            } => {
                self.queue.enqueue(&org, &cluster, &packet)?;
                Response::Ok
            }
            Request::EnqueueNotification {
                org,
                cluster,
                request,
            } => Response::RequestId {
                request_id: self.queue.enqueue_notification(&org, &cluster, request)?,
            },
            Request::Peek { org, cluster } => Response::Delivery {
                delivery: self.queue.peek(&org, &cluster)?,
            },
            Request::Ack { org, cluster } => {
                self.queue.ack_head(&org, &cluster)?;
                Response::Ok
            }
            Request::AckNotification { org, cluster } => {
                self.queue.ack_notification_head(&org, &cluster)?;
                Response::Ok
            }
            Request::Retry { org, cluster } => {
                self.queue.retry_head(&org, &cluster)?;
                Response::Ok
            }
            Request::QueueDepth { org, cluster } => Response::Depth {
                depth: self.queue.depth(&org, &cluster)?,
            },
            Request::PostNotification {
                request_id,
                notification,
            } => {
                self.results.post(&request_id, &notification)?;
                Response::Ok
            }
            Request::AwaitNotification { request_id } => Response::Notification {
                notification: self.results.wait(&request_id).await?,
            },

            Request::SubmitWatch { cluster, keys } => {
                self.submit_watch(&cluster, keys).await?;
                Response::Ok
            }

            Request::PipelineStatus { pipeline, uvn } => {
                let uvn = uvn.unwrap_or_else(|| LATEST.to_string());
                let steps = self.steps_of(&pipeline, &uvn)?;
                Response::PipelineStatus {
                    status: derive_status(self.logs.audit(), &self.runs, &pipeline, &steps, &uvn)?,
                }
            }
            Request::CancelPipeline { pipeline } => {
                let steps = self.steps_of(&pipeline, LATEST)?;
                Response::Cancelled {
                    uvn: cancel_latest_pipeline(self.logs.audit(), &pipeline, &steps)?,
                }
            }
            Request::RunHistory { pipeline, count } => Response::Runs {
                runs: self.runs.history(&pipeline, count)?,
            },
            Request::StepLogs {
                pipeline,
                step,
                page,
            } => Response::Logs {
                logs: self.logs.audit().page(&pipeline, &step, page)?,
            },
        };
        Ok(response)
    }

    /// Queue a MarkNoDeploy notification and wait for the agent's answer
    async fn mark_no_deploy(
        &self,
        org: &str,
        cluster: &str,
        namespace: Option<String>,
        apply: bool,
    ) -> Result<Response, RequestError> {
        let request = NotificationRequest::MarkNoDeploy {
            cluster: cluster.to_string(),
            namespace,
            apply,
        };
        let request_id = self.queue.enqueue_notification(org, cluster, request)?;
        Ok(Response::Notification {
            notification: self.results.wait(&request_id).await?,
        })
    }

    async fn submit_watch(
        &self,
        cluster: &str,
        keys: Vec<keel_core::WatchKey>,
    ) -> Result<(), RequestError> {
        let intake = self
            .intakes
            .get(cluster)
            .ok_or_else(|| RequestError::NoReconciler(cluster.to_string()))?;
        let count = keys.len();
        for key in keys {
            intake
                .send(WatchMessage::Key(key))
                .await
                .map_err(|_| RequestError::ReconcilerStopped(cluster.to_string()))?;
        }
        intake
            .send(WatchMessage::EndOfBatch)
            .await
            .map_err(|_| RequestError::ReconcilerStopped(cluster.to_string()))?;
        debug!(cluster, count, "watch batch submitted");
        Ok(())
    }

    /// Steps of a pipeline: from its definition, else from the run record
    fn steps_of(&self, pipeline: &PipelineRef, uvn: &str) -> Result<Vec<String>, EngineError> {
        if let Some(definition) = self.definitions.get(&pipeline.pipeline) {
            return Ok(definition.graph().ordered_steps());
        }
        let run = if uvn == LATEST {
            self.runs.latest(pipeline)?
        } else {
            self.runs.find(pipeline, uvn)?
        };
        run.map(|run| run.steps)
            .ok_or_else(|| EngineError::RunNotFound(format!("{}/{}", pipeline, uvn)))
    }
}

/// Handle a single client connection
pub async fn handle_connection<S: DurableStore, I: IdGen>(
    handler: Handler<S, I>,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    let response = handler.handle(request).await;

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
