mod network_ecn;
mod packet;
mod queues;
mod sim_time;
mod simulator;
