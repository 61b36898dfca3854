mod collector;

pub use collector::Collector;
