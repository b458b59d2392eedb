//! Foreign Function Interface (FFI) for C/C++ interoperability
//!
//! A small C API over the crate's three operations: evaluating an expression
//! (optionally against a scope of variables) and listing the nodes of one
//! kind. Results are written as NUL-terminated text into caller-provided
//! buffers, so the library never hands out memory the caller has to free,
//! except for the scope handle.
//!
//! # Example Usage
//!
//! ```c
//! MathScope* scope = mathexpr_scope_new();
//! mathexpr_scope_set_decimal(scope, "num1", "4");
//! mathexpr_scope_set_number(scope, "float0", 0.61);
//!
//! char out[128];
//! ExprResult r = mathexpr_eval("num1 + cos(float0)", scope, out, sizeof out);
//! if (r.status == 0) {
//!     printf("%s\n", out);
//! } else {
//!     printf("error %d: %s\n", r.status, r.error);
//! }
//!
//! r = mathexpr_collect_nodes("num1 + num1 * 2", MATHEXPR_NODE_SYMBOL, out, sizeof out);
//! // out == "num1,num1"
//!
//! mathexpr_scope_free(scope);
//! ```
//!
//! # Status codes
//!
//! `0` is success. Positive codes are expression errors and match
//! [`ExprError::error_code`]. Negative codes report misuse of the API itself
//! (`FFI_ERROR_*`).

use core::ffi::c_char;
use core::ptr;
use std::ffi::CStr;

use crate::context::Scope;
use crate::engine::{collect_node_names, evaluate_with_scope};
use crate::error::ExprError;
use crate::types::NodeKind;

/// Size of the error message buffer in [`ExprResult`], including the NUL.
pub const MATHEXPR_ERROR_BUFFER_SIZE: usize = 256;

/// Node kind codes accepted by [`mathexpr_collect_nodes`].
pub const MATHEXPR_NODE_SYMBOL: i32 = 0;
pub const MATHEXPR_NODE_OPERATOR: i32 = 1;
pub const MATHEXPR_NODE_CONSTANT: i32 = 2;
pub const MATHEXPR_NODE_PARENTHESIS: i32 = 3;
pub const MATHEXPR_NODE_FUNCTION: i32 = 4;

/// FFI error codes (negative to distinguish from ExprError codes)
pub const FFI_ERROR_NULL_POINTER: i32 = -1;
pub const FFI_ERROR_INVALID_UTF8: i32 = -2;
pub const FFI_ERROR_BUFFER_TOO_SMALL: i32 = -3;
pub const FFI_ERROR_INVALID_KIND: i32 = -4;
pub const FFI_ERROR_INVALID_VALUE: i32 = -5;

/// Result structure for FFI operations
#[repr(C)]
#[derive(Debug)]
pub struct ExprResult {
    /// Error code: 0 for success, positive for ExprError, negative for FFI errors
    pub status: i32,
    /// Nearest double to the result of `mathexpr_eval` (NaN otherwise)
    pub value: f64,
    /// Length in bytes of the text written to the output buffer, without the
    /// NUL. With `FFI_ERROR_BUFFER_TOO_SMALL` it is the length that was needed.
    pub length: usize,
    /// Error message (empty string on success, no freeing needed)
    pub error: [c_char; MATHEXPR_ERROR_BUFFER_SIZE],
}

impl ExprResult {
    fn copy_to_error_buffer(msg: &str) -> [c_char; MATHEXPR_ERROR_BUFFER_SIZE] {
        let mut buffer = [0; MATHEXPR_ERROR_BUFFER_SIZE];
        let bytes = msg.as_bytes();
        let copy_len = bytes.len().min(MATHEXPR_ERROR_BUFFER_SIZE - 1);
        for (slot, byte) in buffer.iter_mut().zip(&bytes[..copy_len]) {
            *slot = *byte as c_char;
        }
        buffer
    }

    fn success(value: f64, length: usize) -> Self {
        ExprResult {
            status: 0,
            value,
            length,
            error: [0; MATHEXPR_ERROR_BUFFER_SIZE],
        }
    }

    fn from_expr_error(err: &ExprError) -> Self {
        ExprResult {
            status: err.error_code(),
            value: f64::NAN,
            length: 0,
            error: Self::copy_to_error_buffer(&err.to_string()),
        }
    }

    fn from_ffi_error(code: i32, msg: &str) -> Self {
        ExprResult {
            status: code,
            value: f64::NAN,
            length: 0,
            error: Self::copy_to_error_buffer(msg),
        }
    }

    /// The error message as a Rust string.
    pub fn error_message(&self) -> String {
        let bytes: Vec<u8> = self
            .error
            .iter()
            .take_while(|c| **c != 0)
            .map(|c| *c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Opaque type for a variable scope
#[repr(C)]
pub struct MathScope {
    _private: [u8; 0],
}

/// Borrows a C string as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn c_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, ExprResult> {
    if ptr.is_null() {
        return Err(ExprResult::from_ffi_error(
            FFI_ERROR_NULL_POINTER,
            &format!("{what} pointer is null"),
        ));
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().map_err(|_| {
        ExprResult::from_ffi_error(FFI_ERROR_INVALID_UTF8, &format!("{what} is not valid UTF-8"))
    })
}

/// Copies `text` and a NUL terminator into `out`.
///
/// # Safety
/// `out` must be null or valid for writes of `out_len` bytes.
unsafe fn write_output(text: &str, value: f64, out: *mut c_char, out_len: usize) -> ExprResult {
    if out.is_null() {
        return ExprResult::from_ffi_error(FFI_ERROR_NULL_POINTER, "Output buffer pointer is null");
    }
    if text.len() >= out_len {
        let mut result = ExprResult::from_ffi_error(
            FFI_ERROR_BUFFER_TOO_SMALL,
            &format!("Output needs {} bytes, buffer has {out_len}", text.len() + 1),
        );
        result.length = text.len();
        return result;
    }
    unsafe {
        ptr::copy_nonoverlapping(text.as_ptr().cast::<c_char>(), out, text.len());
        *out.add(text.len()) = 0;
    }
    ExprResult::success(value, text.len())
}

/// Create a new, empty scope
///
/// # Safety
/// The returned pointer must be freed with mathexpr_scope_free()
#[unsafe(no_mangle)]
pub extern "C" fn mathexpr_scope_new() -> *mut MathScope {
    Box::into_raw(Box::new(Scope::new())) as *mut MathScope
}

/// Free a scope
///
/// # Safety
/// - The pointer must be null or have been created by mathexpr_scope_new()
/// - The pointer must not be used after calling this function
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mathexpr_scope_free(scope: *mut MathScope) {
    if scope.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(scope as *mut Scope));
    }
}

/// Number of variables bound in a scope (0 for a null scope)
///
/// # Safety
/// `scope` must be null or a live pointer from mathexpr_scope_new().
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mathexpr_scope_len(scope: *const MathScope) -> usize {
    if scope.is_null() {
        return 0;
    }
    unsafe { &*(scope as *const Scope) }.len()
}

/// Bind a variable to a double, converted through its shortest decimal form
///
/// # Safety
/// `scope` must be a live pointer from mathexpr_scope_new() and `name` a
/// NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mathexpr_scope_set_number(
    scope: *mut MathScope,
    name: *const c_char,
    value: f64,
) -> ExprResult {
    if scope.is_null() {
        return ExprResult::from_ffi_error(FFI_ERROR_NULL_POINTER, "Scope pointer is null");
    }
    let name = match unsafe { c_str(name, "Name") } {
        Ok(name) => name,
        Err(result) => return result,
    };
    let scope = unsafe { &mut *(scope as *mut Scope) };
    match scope.insert_f64(name, value) {
        Ok(()) => ExprResult::success(value, 0),
        Err(err) => ExprResult::from_ffi_error(FFI_ERROR_INVALID_VALUE, &err.to_string()),
    }
}

/// Bind a variable to a decimal string such as "4", "-0.25" or "1e3"
///
/// # Safety
/// `scope` must be a live pointer from mathexpr_scope_new(); `name` and
/// `value` must be NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mathexpr_scope_set_decimal(
    scope: *mut MathScope,
    name: *const c_char,
    value: *const c_char,
) -> ExprResult {
    if scope.is_null() {
        return ExprResult::from_ffi_error(FFI_ERROR_NULL_POINTER, "Scope pointer is null");
    }
    let (name, text) = match unsafe { (c_str(name, "Name"), c_str(value, "Value")) } {
        (Ok(name), Ok(text)) => (name, text),
        (Err(result), _) | (_, Err(result)) => return result,
    };
    let scope = unsafe { &mut *(scope as *mut Scope) };
    match scope.insert_str(name, text) {
        Ok(()) => ExprResult::success(scope.get(name).map_or(f64::NAN, |v| v.to_f64()), 0),
        Err(err) => ExprResult::from_ffi_error(FFI_ERROR_INVALID_VALUE, &err.to_string()),
    }
}

/// Evaluate an expression and write its plain decimal text to `out`
///
/// A null `scope` evaluates without variables.
///
/// # Safety
/// `expression` must be a NUL-terminated string, `scope` null or a live
/// pointer from mathexpr_scope_new(), and `out` valid for `out_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mathexpr_eval(
    expression: *const c_char,
    scope: *const MathScope,
    out: *mut c_char,
    out_len: usize,
) -> ExprResult {
    let expression = match unsafe { c_str(expression, "Expression") } {
        Ok(expression) => expression,
        Err(result) => return result,
    };
    let empty = Scope::new();
    let scope = if scope.is_null() {
        &empty
    } else {
        unsafe { &*(scope as *const Scope) }
    };
    match evaluate_with_scope(expression, scope) {
        Ok(text) => {
            let value = text.parse::<f64>().unwrap_or(f64::NAN);
            unsafe { write_output(&text, value, out, out_len) }
        }
        Err(err) => ExprResult::from_expr_error(&err),
    }
}

/// List the nodes of one kind, comma-joined, in pre-order
///
/// `kind` is one of the `MATHEXPR_NODE_*` codes. Node texts are joined with
/// `,` without spaces; texts of calls and operators may contain commas of
/// their own.
///
/// # Safety
/// `expression` must be a NUL-terminated string and `out` valid for
/// `out_len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn mathexpr_collect_nodes(
    expression: *const c_char,
    kind: i32,
    out: *mut c_char,
    out_len: usize,
) -> ExprResult {
    let expression = match unsafe { c_str(expression, "Expression") } {
        Ok(expression) => expression,
        Err(result) => return result,
    };
    let Some(kind) = NodeKind::from_code(kind) else {
        return ExprResult::from_ffi_error(FFI_ERROR_INVALID_KIND, &format!("Unknown node kind {kind}"));
    };
    match collect_node_names(expression, kind) {
        Ok(names) => unsafe { write_output(&names.join(","), f64::NAN, out, out_len) },
        Err(err) => ExprResult::from_expr_error(&err),
    }
}
