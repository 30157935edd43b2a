/*
 * Copyright © 2024. EcomDev B.V.
 * All rights reserved.
 * See LICENSE for license details.
 */
use std::error::Error;

use thiserror::Error;

use crate::aggregate::AggregatorClosed;

#[derive(Error, Debug)]
pub enum ConsumptionError {
    #[error("Connection to message broker is lost")]
    Disconnected,

    #[error("Partition {0} is not assigned to this consumer")]
    UnknownPartition(i32),

    #[error(transparent)]
    AggregatorClosed(#[from] AggregatorClosed),

    // Broker clients report their own error types
    #[error(transparent)]
    Dynamic(#[from] Box<dyn Error + Send + Sync>),
}

impl From<std::io::Error> for ConsumptionError {
    fn from(value: std::io::Error) -> Self {
        ConsumptionError::Dynamic(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn can_be_created_from_io_error() {
        let error: ConsumptionError = Error::from(ErrorKind::ConnectionReset).into();

        assert!(matches!(error, ConsumptionError::Dynamic(_)));
    }

    #[test]
    fn keeps_aggregator_closed_message() {
        let error: ConsumptionError = AggregatorClosed.into();

        assert_eq!(error.to_string(), "Aggregator is not running anymore");
    }
}
