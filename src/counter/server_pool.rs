//! Server pool and join-shortest-queue assignment
//!
//! Each server owns its own first-come-first-served line. The customer at the
//! front of a line is the one being served; an idle server has an empty line
//! and no pending departure.

use crate::types::ServerId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One service position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    id: ServerId,
    /// Arrival times of the customers in line, front is in service
    line: VecDeque<f64>,
    /// Completion time of the current service, `None` when idle
    next_departure: Option<f64>,
    /// Customers whose service has completed
    served: usize,
}

impl Server {
    fn new(id: ServerId) -> Self {
        Self { id, line: VecDeque::new(), next_departure: None, served: 0 }
    }

    /// Server identifier
    pub fn id(&self) -> ServerId {
        self.id
    }

    /// Customers at this server, including the one in service
    pub fn occupancy(&self) -> usize {
        self.line.len()
    }

    /// When the current service completes, `None` when idle
    pub fn next_departure(&self) -> Option<f64> {
        self.next_departure
    }

    /// Whether nobody is at this server
    pub fn is_idle(&self) -> bool {
        self.line.is_empty()
    }

    /// Customers served so far
    pub fn served(&self) -> usize {
        self.served
    }
}

/// Result of completing a service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    /// Server that finished
    pub server: ServerId,
    /// Customers still in this server's line
    pub remaining: usize,
}

/// Fixed-size pool of servers indexed by [`ServerId`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerPool {
    servers: Vec<Server>,
}

impl ServerPool {
    /// Create `size` idle servers
    pub fn new(size: usize) -> Self {
        Self { servers: (0..size).map(|i| Server::new(ServerId(i))).collect() }
    }

    /// Number of servers
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether the pool has no servers at all
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// All servers in id order
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Server by id
    pub fn server(&self, id: ServerId) -> &Server {
        &self.servers[id.index()]
    }

    /// Customers currently in the system
    pub fn in_system(&self) -> usize {
        self.servers.iter().map(Server::occupancy).sum()
    }

    /// Whether any server has a customer
    pub fn any_occupied(&self) -> bool {
        self.servers.iter().any(|server| !server.is_idle())
    }

    /// Server with the fewest customers, lowest id on ties
    pub fn shortest_queue(&self) -> ServerId {
        self.servers
            .iter()
            .enumerate()
            .min_by_key(|(index, server)| (server.occupancy(), *index))
            .map(|(_, server)| server.id)
            .unwrap_or(ServerId(0))
    }

    /// Busy server finishing first, lowest id on ties
    pub fn earliest_departure(&self) -> Option<(ServerId, f64)> {
        let mut earliest: Option<(ServerId, f64)> = None;
        for server in &self.servers {
            if let Some(time) = server.next_departure {
                match earliest {
                    Some((_, best)) if best <= time => {}
                    _ => earliest = Some((server.id, time)),
                }
            }
        }
        earliest
    }

    /// Put a customer who arrived at `arrival` in `id`'s line
    ///
    /// Returns true when the server was idle, meaning the caller must start
    /// service right away.
    pub fn admit(&mut self, id: ServerId, arrival: f64) -> bool {
        let server = &mut self.servers[id.index()];
        server.line.push_back(arrival);
        server.line.len() == 1
    }

    /// Begin serving the customer at the front of `id`'s line
    ///
    /// Returns how long that customer waited in line.
    pub fn start_service(&mut self, id: ServerId, now: f64, service_minutes: u32) -> f64 {
        let server = &mut self.servers[id.index()];
        server.next_departure = Some(now + f64::from(service_minutes));
        server.line.front().map_or(0.0, |arrival| now - arrival)
    }

    /// Finish the current service at `id`
    ///
    /// The server is marked idle; if customers remain the caller schedules the
    /// next service with [`ServerPool::start_service`].
    pub fn complete_service(&mut self, id: ServerId) -> Completion {
        let server = &mut self.servers[id.index()];
        server.line.pop_front();
        server.next_departure = None;
        server.served += 1;
        Completion { server: id, remaining: server.line.len() }
    }

    /// Customers served per server
    pub fn served_per_server(&self) -> Vec<usize> {
        self.servers.iter().map(Server::served).collect()
    }
}
