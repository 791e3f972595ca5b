//! Async event loop around the scan controller

use std::time::Duration;

use attendance::{CheckInResponse, CheckInStatus, EndSessionResponse};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::client::{CheckInApi, ClientError};
use crate::controller::{ScanController, Step, Submission};
use crate::feedback::{Feedback, Tone};
use crate::lifecycle::SessionLifecycle;

/// Events from the scan device or the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskInput {
    /// Current content of the input field
    Changed(String),
    Submit,
    EndSession,
}

enum Reply {
    CheckIn {
        code: String,
        result: Result<CheckInResponse, ClientError>,
    },
    EndSession(Result<EndSessionResponse, ClientError>),
}

pub struct KioskDriver<C> {
    api: C,
    controller: ScanController,
    lifecycle: SessionLifecycle,
    debounce: Duration,
    feedback: mpsc::Sender<Feedback>,
}

impl<C: CheckInApi> KioskDriver<C> {
    pub fn new(
        api: C,
        controller: ScanController,
        debounce: Duration,
        feedback: mpsc::Sender<Feedback>,
    ) -> Self {
        Self {
            api,
            controller,
            lifecycle: SessionLifecycle::new(),
            debounce,
            feedback,
        }
    }

    /// Run until `input` closes, then wait for outstanding replies
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<KioskInput>,
        mut online: watch::Receiver<bool>,
    ) {
        let (reply_tx, mut replies) = mpsc::channel(32);
        let debounce = sleep(Duration::ZERO);
        tokio::pin!(debounce);
        let mut armed = false;
        let mut probe_alive = true;

        let initially_online = *online.borrow_and_update();
        self.controller.set_online(initially_online);
        if !initially_online {
            self.emit(Feedback::Connectivity { online: false }).await;
        }

        loop {
            tokio::select! {
                event = input.recv() => {
                    let Some(event) = event else { break };
                    match event {
                        KioskInput::Changed(text) => match self.controller.on_change(&text) {
                            Step::Wait => armed = false,
                            Step::ArmDebounce => {
                                debounce.as_mut().reset(Instant::now() + self.debounce);
                                armed = true;
                            }
                            Step::FireNow => {
                                armed = false;
                                self.fire(&reply_tx).await;
                            }
                        },
                        KioskInput::Submit => {
                            if self.controller.on_submit() == Step::FireNow {
                                armed = false;
                                self.fire(&reply_tx).await;
                            }
                        }
                        KioskInput::EndSession => self.request_end(&reply_tx).await,
                    }
                }
                () = &mut debounce, if armed => {
                    armed = false;
                    self.fire(&reply_tx).await;
                }
                changed = online.changed(), if probe_alive => match changed {
                    Ok(()) => {
                        let now_online = *online.borrow_and_update();
                        if self.controller.set_online(now_online) {
                            if now_online {
                                info!("Check-in endpoint reachable again");
                            } else {
                                warn!("Check-in endpoint unreachable; submissions disabled");
                            }
                            self.emit(Feedback::Connectivity { online: now_online }).await;
                        }
                    }
                    Err(_) => {
                        warn!("Reachability probe stopped");
                        probe_alive = false;
                    }
                },
                Some(reply) = replies.recv() => self.handle_reply(reply).await,
            }
        }

        while self.controller.in_flight() > 0 || self.lifecycle.is_pending() {
            match replies.recv().await {
                Some(reply) => self.handle_reply(reply).await,
                None => break,
            }
        }
        debug!("Kiosk driver stopped");
    }

    async fn fire(&mut self, replies: &mpsc::Sender<Reply>) {
        if !self.lifecycle.accepts_check_ins() {
            let code = self.controller.discard();
            if !code.is_empty() {
                self.emit(Feedback::Message {
                    tone: Tone::Error,
                    text: "This session has ended".to_string(),
                })
                .await;
            }
            return;
        }

        match self.controller.fire() {
            Submission::Send(code) => {
                debug!("Submitting check-in for {}", code);
                let api = self.api.clone();
                let replies = replies.clone();
                tokio::spawn(async move {
                    let result = api.check_in(&code).await;
                    let _ = replies.send(Reply::CheckIn { code, result }).await;
                });
            }
            Submission::Suppressed(code) => debug!("Ignored repeated scan of {}", code),
            Submission::Offline(code) => {
                warn!("Dropped check-in of {} while offline", code);
                self.emit(Feedback::dropped(&code)).await;
            }
            Submission::Empty => {}
        }
    }

    async fn request_end(&mut self, replies: &mpsc::Sender<Reply>) {
        if !self.lifecycle.request_end() {
            self.emit(Feedback::Session(self.lifecycle.view())).await;
            return;
        }
        self.emit(Feedback::Session(self.lifecycle.view())).await;

        let api = self.api.clone();
        let replies = replies.clone();
        tokio::spawn(async move {
            let result = api.end_session().await;
            let _ = replies.send(Reply::EndSession(result)).await;
        });
    }

    async fn handle_reply(&mut self, reply: Reply) {
        match reply {
            Reply::CheckIn {
                code,
                result: Ok(response),
            } => {
                self.controller.on_reply(&code, true);
                info!("Check-in of {}: {:?}", code, response.status);
                self.emit(Feedback::from_reply(&response)).await;
                if response.status == CheckInStatus::SessionInactive {
                    self.lifecycle.observe_ended();
                    self.emit(Feedback::Session(self.lifecycle.view())).await;
                }
            }
            Reply::CheckIn {
                code,
                result: Err(err),
            } => {
                self.controller.on_reply(&code, false);
                warn!("Check-in of {} failed: {}", code, err);
                self.emit(Feedback::from_failure(&code, &err)).await;
            }
            Reply::EndSession(Ok(response)) => {
                self.lifecycle.reconcile(response.session.active);
                info!(
                    "End of session {} confirmed (ended now: {})",
                    response.session.id, response.ended
                );
                self.emit(Feedback::Session(self.lifecycle.view())).await;
            }
            Reply::EndSession(Err(err)) => {
                self.lifecycle.rollback();
                warn!("Ending the session failed: {}", err);
                self.emit(Feedback::Message {
                    tone: Tone::Error,
                    text: format!("Could not end the session: {}", err),
                })
                .await;
                self.emit(Feedback::Session(self.lifecycle.view())).await;
            }
        }
    }

    async fn emit(&self, feedback: Feedback) {
        if self.feedback.send(feedback).await.is_err() {
            debug!("Feedback receiver closed");
        }
    }
}
