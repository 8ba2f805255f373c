pub mod analyst;
pub mod briefing;
pub mod sentiment;
pub mod strategist;
