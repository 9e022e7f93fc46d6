mod auction_flow;
mod edge_cases;
mod signaling;
