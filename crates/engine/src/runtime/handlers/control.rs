// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control actions from the UI: session deletion, self-update, skills.

use crate::error::RuntimeError;
use crate::runtime::Runtime;
use milo_adapters::{PubSub, RemoteApi, WorkerAdapter};
use milo_core::{Clock, Event, EventPayload, SessionId, SessionStatus, UiActionKind};

impl<W, R, P, C> Runtime<W, R, P, C>
where
    W: WorkerAdapter,
    R: RemoteApi,
    P: PubSub,
    C: Clock,
{
    pub(crate) async fn handle_ui_action(
        &self,
        action: &str,
        session_id: Option<SessionId>,
        payload: Option<serde_json::Value>,
    ) -> Result<Vec<Event>, RuntimeError> {
        let Some(kind) = UiActionKind::parse(action) else {
            tracing::warn!(action, "unknown ui action");
            self.ui_result(action, false, Some("unknown action")).await;
            return Ok(vec![]);
        };

        match kind {
            UiActionKind::DeleteSession => {
                let Some(session_id) = session_id else {
                    self.ui_result(action, false, Some("sessionId required")).await;
                    return Ok(vec![]);
                };
                let events = if self.with_existing_actor(&session_id, |_| ()).is_some() {
                    self.close_actor(&session_id).await?
                } else {
                    // No live actor; close the persisted record directly.
                    self.set_session_status(&session_id, SessionStatus::Closed)
                        .await;
                    vec![]
                };
                self.ui_result(action, true, None).await;
                Ok(events)
            }

            UiActionKind::CheckUpdates => {
                let detail = self.update.check();
                self.ui_result(action, true, Some(&detail)).await;
                Ok(vec![])
            }

            UiActionKind::UpdateAgent => match self.launch_update() {
                Ok(()) => {
                    self.ui_result(action, true, Some("restarting")).await;
                    Ok(vec![Event::Shutdown])
                }
                Err(e) => {
                    tracing::error!(error = %e, "self-update launch failed");
                    self.ui_result(action, false, Some(&e.to_string())).await;
                    Ok(vec![])
                }
            },

            UiActionKind::SkillInstall => {
                let result = skill_args(&payload, true).and_then(|(slug, content, bundle)| {
                    self.skills
                        .install(&slug, &content, bundle)
                        .map(|_| slug)
                        .map_err(|e| e.to_string())
                });
                self.report_skill(action, result).await;
                Ok(vec![])
            }

            UiActionKind::SkillUpdate => {
                let result = skill_args(&payload, true).and_then(|(slug, content, _)| {
                    self.skills
                        .update(&slug, &content)
                        .map(|_| slug)
                        .map_err(|e| e.to_string())
                });
                self.report_skill(action, result).await;
                Ok(vec![])
            }

            UiActionKind::SkillDelete => {
                let result = skill_args(&payload, false).and_then(|(slug, _, _)| {
                    self.skills.delete(&slug).map(|_| slug).map_err(|e| e.to_string())
                });
                self.report_skill(action, result).await;
                Ok(vec![])
            }
        }
    }

    fn launch_update(&self) -> std::io::Result<()> {
        self.update.prepare()?;
        self.update.launch()
    }

    async fn report_skill(&self, action: &str, result: Result<String, String>) {
        match result {
            Ok(slug) => self.ui_result(action, true, Some(&slug)).await,
            Err(detail) => self.ui_result(action, false, Some(&detail)).await,
        }
    }

    async fn ui_result(&self, action: &str, ok: bool, detail: Option<&str>) {
        self.outbound
            .publish(EventPayload::UiActionResult {
                action: action.to_string(),
                ok,
                detail: detail.map(str::to_string),
            })
            .await;
    }
}

/// Pull `{slug, content?, bundle?}` out of a ui_action payload.
fn skill_args(
    payload: &Option<serde_json::Value>,
    content_required: bool,
) -> Result<(String, String, bool), String> {
    let payload = payload.as_ref().ok_or("payload required")?;
    let slug = payload
        .get("slug")
        .and_then(|v| v.as_str())
        .ok_or("slug required")?
        .to_string();
    let content = match payload.get("content").and_then(|v| v.as_str()) {
        Some(content) => content.to_string(),
        None if content_required => return Err("content required".into()),
        None => String::new(),
    };
    let bundle = payload
        .get("bundle")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Ok((slug, content, bundle))
}
