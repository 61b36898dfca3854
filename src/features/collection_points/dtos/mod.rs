mod point_dto;

pub use point_dto::{CreatePointDto, FeedbackDto, TransitionPayload};
