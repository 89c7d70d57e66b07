//! Unit tests for `tessel_rule`.


mod behaviour;
