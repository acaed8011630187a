//! Stable status codes and their names.
//!
//! Every public operation reports one of these codes. The numeric values are
//! part of the external contract and never change between releases; names are
//! produced by [`return_flag_name`] for logs and diagnostics.

/// Status codes returned by integrator operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ReturnFlag {
    Success = 0,
    TstopReturn = 1,
    RootReturn = 2,
    Warning = 99,
    TooMuchWork = -1,
    TooMuchAcc = -2,
    ErrFailure = -3,
    ConvFailure = -4,
    LinitFail = -5,
    LsetupFail = -6,
    LsolveFail = -7,
    RhsfuncFail = -8,
    FirstRhsfuncErr = -9,
    ReptdRhsfuncErr = -10,
    UnrecRhsfuncErr = -11,
    RtfuncFail = -12,
    NlsInitFail = -13,
    NlsSetupFail = -14,
    ConstrFail = -15,
    NlsFail = -16,
    MemFail = -20,
    MemNull = -21,
    IllInput = -22,
    NoMalloc = -23,
    BadK = -24,
    BadT = -25,
    BadDky = -26,
    TooClose = -27,
    VectoropErr = -28,
    ProjMemNull = -29,
    ProjfuncFail = -30,
    ReptdProjfuncErr = -31,
    UnrecognizedErr = -99,
}

/// Every known flag, in table order.
pub const ALL_FLAGS: [ReturnFlag; 33] = [
    ReturnFlag::Success,
    ReturnFlag::TstopReturn,
    ReturnFlag::RootReturn,
    ReturnFlag::Warning,
    ReturnFlag::TooMuchWork,
    ReturnFlag::TooMuchAcc,
    ReturnFlag::ErrFailure,
    ReturnFlag::ConvFailure,
    ReturnFlag::LinitFail,
    ReturnFlag::LsetupFail,
    ReturnFlag::LsolveFail,
    ReturnFlag::RhsfuncFail,
    ReturnFlag::FirstRhsfuncErr,
    ReturnFlag::ReptdRhsfuncErr,
    ReturnFlag::UnrecRhsfuncErr,
    ReturnFlag::RtfuncFail,
    ReturnFlag::NlsInitFail,
    ReturnFlag::NlsSetupFail,
    ReturnFlag::ConstrFail,
    ReturnFlag::NlsFail,
    ReturnFlag::MemFail,
    ReturnFlag::MemNull,
    ReturnFlag::IllInput,
    ReturnFlag::NoMalloc,
    ReturnFlag::BadK,
    ReturnFlag::BadT,
    ReturnFlag::BadDky,
    ReturnFlag::TooClose,
    ReturnFlag::VectoropErr,
    ReturnFlag::ProjMemNull,
    ReturnFlag::ProjfuncFail,
    ReturnFlag::ReptdProjfuncErr,
    ReturnFlag::UnrecognizedErr,
];

/// Name emitted for codes outside the table.
pub const UNKNOWN_FLAG_NAME: &str = "NONE";

impl ReturnFlag {
    /// Numeric code as seen across the C boundary.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Look up a flag by its numeric code.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        ALL_FLAGS.iter().copied().find(|f| i64::from(f.code()) == code)
    }

    /// Canonical upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::TstopReturn => "TSTOP_RETURN",
            Self::RootReturn => "ROOT_RETURN",
            Self::Warning => "WARNING",
            Self::TooMuchWork => "TOO_MUCH_WORK",
            Self::TooMuchAcc => "TOO_MUCH_ACC",
            Self::ErrFailure => "ERR_FAILURE",
            Self::ConvFailure => "CONV_FAILURE",
            Self::LinitFail => "LINIT_FAIL",
            Self::LsetupFail => "LSETUP_FAIL",
            Self::LsolveFail => "LSOLVE_FAIL",
            Self::RhsfuncFail => "RHSFUNC_FAIL",
            Self::FirstRhsfuncErr => "FIRST_RHSFUNC_ERR",
            Self::ReptdRhsfuncErr => "REPTD_RHSFUNC_ERR",
            Self::UnrecRhsfuncErr => "UNREC_RHSFUNC_ERR",
            Self::RtfuncFail => "RTFUNC_FAIL",
            Self::NlsInitFail => "NLS_INIT_FAIL",
            Self::NlsSetupFail => "NLS_SETUP_FAIL",
            Self::ConstrFail => "CONSTR_FAIL",
            Self::NlsFail => "NLS_FAIL",
            Self::MemFail => "MEM_FAIL",
            Self::MemNull => "MEM_NULL",
            Self::IllInput => "ILL_INPUT",
            Self::NoMalloc => "NO_MALLOC",
            Self::BadK => "BAD_K",
            Self::BadT => "BAD_T",
            Self::BadDky => "BAD_DKY",
            Self::TooClose => "TOO_CLOSE",
            Self::VectoropErr => "VECTOROP_ERR",
            Self::ProjMemNull => "PROJ_MEM_NULL",
            Self::ProjfuncFail => "PROJFUNC_FAIL",
            Self::ReptdProjfuncErr => "REPTD_PROJFUNC_ERR",
            Self::UnrecognizedErr => "UNRECOGNIZED_ERR",
        }
    }

    /// True for codes that signal a failed operation.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        (self as i32) < 0
    }
}

/// Translate a numeric status code into a freshly allocated name.
///
/// Unknown codes map to [`UNKNOWN_FLAG_NAME`]; this never fails.
#[must_use]
pub fn return_flag_name(code: i64) -> String {
    ReturnFlag::from_code(code)
        .map_or(UNKNOWN_FLAG_NAME, ReturnFlag::name)
        .to_string()
}
