//! Medical insurance cost predictor: collects six patient fields, encodes
//! them into the fixed-order feature vector a pre-trained tree-ensemble
//! regressor expects, and returns the estimated charges. The model artifact
//! is trained offline and loaded from disk once at startup; this crate only
//! validates, encodes, evaluates, and presents.

pub mod artifact;
pub mod common;
pub mod encoder;
pub mod forest;
pub mod profile;
pub mod ui;
