//! Declarative macros for generating CLI parsing, execute, and output tests.
//!
//! Instead of writing repetitive test functions, declare the test cases
//! and let the macro generate the actual test code.

/// Generate a single CLI option test.
#[macro_export]
macro_rules! cli_option_test {
    (
        command: $cmd:literal,
        variant: $variant:ident,
        test_name: $test_name:ident,
        args: [$($arg:literal),+],
        field: $field:ident,
        expected: $expected:expr $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let args = Args::try_parse_from([
                "routine_call",
                $cmd,
                $($arg),+
            ]).unwrap();
            match args.command {
                crate::commands::Command::$variant(cmd) => {
                    assert_eq!(cmd.$field, $expected,
                        concat!("Field ", stringify!($field), " mismatch"));
                }
                _ => panic!(concat!("Expected ", stringify!($variant), " command")),
            }
        }
    };
}

/// Generate a test that verifies a command requires a specific argument.
///
/// # Example
///
/// ```ignore
/// cli_required_arg_test! {
///     command: "describe",
///     test_name: test_requires_routine,
///     required_arg: "<ROUTINE>",
/// }
/// ```
#[macro_export]
macro_rules! cli_required_arg_test {
    (
        command: $cmd:literal,
        test_name: $test_name:ident,
        required_arg: $arg:literal $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let result = Args::try_parse_from(["routine_call", $cmd]);
            assert!(result.is_err(), concat!("Command should require ", $arg));
            assert!(
                result.unwrap_err().to_string().contains($arg),
                concat!("Error should mention ", $arg)
            );
        }
    };
}

/// Generate a test that verifies parsing fails with specific invalid args.
#[macro_export]
macro_rules! cli_error_test {
    (
        command: $cmd:literal,
        test_name: $test_name:ident,
        args: [$($arg:literal),+] $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            let result = Args::try_parse_from([
                "routine_call",
                $cmd,
                $($arg),+
            ]);
            assert!(result.is_err());
        }
    };
}

// =============================================================================
// Execute Test Macros
// =============================================================================

/// Generate a test that runs a command against a scripted mock backend.
///
/// # Example
/// ```ignore
/// execute_test! {
///     test_name: test_invoke_scalar,
///     script: MockScript { rows: vec![...], ..MockScript::default() },
///     cmd: InvokeCmd { routine: "ValidateCustomer".to_string(), values: vec![...] },
///     assertions: |result| {
///         assert!(result.envelope.is_success());
///     },
/// }
/// ```
#[macro_export]
macro_rules! execute_test {
    (
        test_name: $test_name:ident,
        script: $script:expr,
        cmd: $cmd:expr,
        assertions: |$result:ident| $body:block $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            use crate::commands::Execute;
            let harness = crate::test_utils::mock_context($script);
            let $result = $cmd.execute(&harness.context).expect("Execute should succeed");
            $body
        }
    };
}

/// Generate a test that verifies command execution fails before any call.
#[macro_export]
macro_rules! execute_error_test {
    (
        test_name: $test_name:ident,
        cmd: $cmd:expr,
        contains: $needle:literal $(,)?
    ) => {
        #[rstest]
        fn $test_name() {
            use crate::commands::Execute;
            let harness = crate::test_utils::mock_context(Default::default());
            let err = $cmd.execute(&harness.context).err().expect("Execute should fail");
            assert!(
                err.to_string().contains($needle),
                "error {:?} should contain {:?}",
                err.to_string(),
                $needle
            );
            assert_eq!(harness.stats.opened(), 0, "No connection should be opened");
        }
    };
}

// =============================================================================
// Output Test Macros
// =============================================================================

/// Generate a test that verifies table output matches expected string.
#[macro_export]
macro_rules! output_table_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        expected: $expected:expr $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use crate::output::Outputable;
            assert_eq!($fixture.to_table(), $expected);
        }
    };
}

/// Generate a test that verifies JSON output is valid and contains expected fields.
///
/// # Example
/// ```ignore
/// output_json_test! {
///     test_name: test_format_json,
///     fixture: success_result,
///     fixture_type: InvokeResult,
///     assertions: {
///         "status": "success",
///     },
/// }
/// ```
#[macro_export]
macro_rules! output_json_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        assertions: { $($field:literal : $expected:expr),* $(,)? } $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use crate::output::{Outputable, OutputFormat};
            let output = $fixture.format(OutputFormat::Json);
            let parsed: serde_json::Value = serde_json::from_str(&output)
                .expect("Should produce valid JSON");
            $(
                assert_eq!(parsed[$field], $expected, concat!("JSON field mismatch: ", $field));
            )*
        }
    };
}

/// Generate a test that verifies Toon output contains expected strings.
#[macro_export]
macro_rules! output_toon_test {
    (
        test_name: $test_name:ident,
        fixture: $fixture:ident,
        fixture_type: $fixture_type:ty,
        contains: [$($needle:literal),* $(,)?] $(,)?
    ) => {
        #[rstest]
        fn $test_name($fixture: $fixture_type) {
            use crate::output::{Outputable, OutputFormat};
            let output = $fixture.format(OutputFormat::Toon);
            $(
                assert!(output.contains($needle), concat!("Toon output should contain: ", $needle));
            )*
        }
    };
}
