pub mod ecn;
pub mod experiment;
pub mod net;
pub mod proto;
pub mod queue;
pub mod sim;
pub mod topo;
pub mod trace;

#[cfg(test)]
mod test;
