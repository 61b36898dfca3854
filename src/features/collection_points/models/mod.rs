mod collection_point;

pub use collection_point::{
    Address, Cancellation, CollectionPoint, Completion, Feedback, HistoryEntry, PointStatus,
    Priority, Quantity, QuantityUnit, Recurrence, RecurrenceFrequency, WasteType,
};
