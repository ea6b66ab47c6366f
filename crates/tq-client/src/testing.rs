//! Scripted executor for tests: canned replies out, recorded requests in.

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::Value;

use crate::executor::{Executor, RawResponse, Request};
use tq_core::{Error, Result};

#[derive(Default)]
pub(crate) struct ScriptedExecutor {
    replies: RefCell<VecDeque<RawResponse>>,
    requests: RefCell<Vec<Request>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, status: u16, body: Value) -> Self {
        self.reply_raw(status, &body.to_string())
    }

    pub(crate) fn reply_raw(self, status: u16, body: &str) -> Self {
        self.replies.borrow_mut().push_back(RawResponse {
            status,
            reason: reason(status).to_string(),
            body: body.to_string(),
        });
        self
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, request: &Request) -> Result<RawResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Transport("no scripted reply".into()))
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        207 => "Multi-Status",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}
