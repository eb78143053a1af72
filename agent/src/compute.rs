/// Task failures reported back to the orchestrator verbatim.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComputeError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("result out of range")]
    OutOfRange,
}

pub fn evaluate(operation: &str, arg1: f64, arg2: f64) -> Result<f64, ComputeError> {
    let result = match operation {
        "+" => arg1 + arg2,
        "-" => arg1 - arg2,
        "*" => arg1 * arg2,
        "/" if arg2 == 0.0 => return Err(ComputeError::DivisionByZero),
        "/" => arg1 / arg2,
        other => return Err(ComputeError::UnknownOperation(other.to_string())),
    };
    // JSON cannot carry inf or NaN.
    if !result.is_finite() {
        return Err(ComputeError::OutOfRange);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations() {
        assert_eq!(evaluate("+", 2.0, 3.0), Ok(5.0));
        assert_eq!(evaluate("-", 2.0, 3.0), Ok(-1.0));
        assert_eq!(evaluate("*", 2.5, 4.0), Ok(10.0));
        assert_eq!(evaluate("/", 9.0, 3.0), Ok(3.0));
    }

    #[test]
    fn test_failures_carry_wire_messages() {
        let err = evaluate("/", 4.0, 0.0).unwrap_err();
        assert_eq!(err, ComputeError::DivisionByZero);
        assert_eq!(err.to_string(), "division by zero");

        let err = evaluate("%", 4.0, 2.0).unwrap_err();
        assert_eq!(err.to_string(), "unknown operation: %");
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = evaluate("*", 1e200, 1e200).unwrap_err();
        assert_eq!(err, ComputeError::OutOfRange);
        assert_eq!(err.to_string(), "result out of range");
        assert_eq!(evaluate("/", f64::MAX, 0.5), Err(ComputeError::OutOfRange));
        assert_eq!(evaluate("+", f64::MAX, 1.0), Ok(f64::MAX));
    }
}
