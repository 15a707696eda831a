//! Published roll requests, kept so result views can be opened later.

use std::collections::VecDeque;
use std::sync::Mutex;

use dashmap::DashMap;

use rollreq_domain::{RequestId, RollRequest};

/// Requests currently known to the engine, bounded to the most recent ones.
pub struct RequestStore {
    requests: DashMap<RequestId, RollRequest>,
    order: Mutex<VecDeque<RequestId>>,
    limit: usize,
}

impl RequestStore {
    pub fn new(limit: usize) -> Self {
        Self {
            requests: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            limit: limit.max(1),
        }
    }

    pub fn insert(&self, request: RollRequest) {
        let id = request.id;
        self.requests.insert(id, request);

        let evicted: Vec<RequestId> = match self.order.lock() {
            Ok(mut order) => {
                order.push_back(id);
                let excess = order.len().saturating_sub(self.limit);
                order.drain(..excess).collect()
            }
            Err(_) => {
                tracing::error!("Request order lock poisoned");
                Vec::new()
            }
        };
        for old in evicted {
            self.requests.remove(&old);
            tracing::debug!(request_id = %old, "Request evicted");
        }
    }

    pub fn get(&self, id: RequestId) -> Option<RollRequest> {
        self.requests.get(&id).map(|r| r.clone())
    }
}
