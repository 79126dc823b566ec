//! Scripted [`ResourceSource`]: each path answers whatever has been staged for it.
//!
//! Paths with nothing staged stay pending, which lets tests hold a load open across a
//! remount and then release it.

use crate::engine::loading::resource_source::{
    LayerResource, LoadStatus, RequestId, ResourceRequest, ResourceSource,
};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct StaticResourceSource {
    next_id: u64,
    staged: HashMap<String, LoadStatus>,
    in_flight: HashMap<RequestId, String>,
    requests: Vec<ResourceRequest>,
    released: Vec<RequestId>,
}

impl StaticResourceSource {
    pub fn stage_loaded(&mut self, path: impl Into<String>, resource: LayerResource) {
        self.staged.insert(path.into(), LoadStatus::Loaded(resource));
    }

    pub fn stage_failed(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.staged
            .insert(path.into(), LoadStatus::Failed(reason.into()));
    }

    /// Every request made so far, in order.
    pub fn requests(&self) -> &[ResourceRequest] {
        &self.requests
    }

    pub fn requested_paths(&self) -> Vec<&str> {
        self.requests.iter().map(|r| r.path.as_str()).collect()
    }

    pub fn released(&self) -> &[RequestId] {
        &self.released
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

impl ResourceSource for StaticResourceSource {
    fn request(&mut self, request: &ResourceRequest) -> RequestId {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.in_flight.insert(id, request.path.clone());
        self.requests.push(request.clone());
        id
    }

    fn poll(&mut self, id: RequestId) -> LoadStatus {
        let Some(path) = self.in_flight.get(&id) else {
            return LoadStatus::Failed(format!("request {} was released", id.0));
        };
        match self.staged.get(path) {
            Some(LoadStatus::Pending) | None => LoadStatus::Pending,
            Some(status) => {
                let status = status.clone();
                self.in_flight.remove(&id);
                status
            }
        }
    }

    fn release(&mut self, id: RequestId) {
        if self.in_flight.remove(&id).is_some() {
            self.released.push(id);
        }
    }
}
