// Domain layer - Plain data types shared by every other layer
pub mod frame;
pub mod health;
pub mod parameter;
pub mod reading;
pub mod record_set;
pub mod ring;
pub mod snapshot;
