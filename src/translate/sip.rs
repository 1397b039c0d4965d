//! SIP response code and Microsoft subcode explanations for PSTN call rows.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Plain-language and technical explanation of one SIP response code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SipExplanation {
    pub simple: &'static str,
    pub detailed: &'static str,
}

/// Explanation of a Microsoft diagnostic subcode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubcodeExplanation {
    pub description: &'static str,
    pub cause: &'static str,
    pub resolution: &'static str,
}

pub const UNKNOWN_SUBCODE: SubcodeExplanation = SubcodeExplanation {
    description: "Unknown subcode",
    cause: "No information available",
    resolution: "Contact support for more information",
};

pub static SIP_CODES: Lazy<HashMap<u16, SipExplanation>> = Lazy::new(|| {
    let entries: &[(u16, &'static str, &'static str)] = &[
        // 1xx provisional
        (100, "Call is being processed. Please wait.", "Trying - The request is being processed, but no definitive response is available yet."),
        (180, "Phone is ringing at the destination.", "Ringing - The destination user agent is alerting the user."),
        (181, "Call is being redirected to another number.", "Call Is Being Forwarded - The call is being redirected to another destination."),
        (182, "Call is in a queue and will be handled soon.", "Queued - The request is queued and will be processed soon."),
        (183, "Call setup is in progress.", "Session Progress - Provides progress information about the call setup."),
        // 2xx success
        (200, "Call connected successfully.", "OK - The request has been successfully processed and accepted."),
        (202, "Request accepted and will be processed.", "Accepted - The request has been accepted for processing, but not completed yet."),
        // 3xx redirection
        (300, "Multiple call destinations found.", "Multiple Choices - The requested address resolves to multiple destinations."),
        (301, "Call destination has permanently changed.", "Moved Permanently - The requested address is no longer valid and has a new permanent address."),
        (302, "Call destination is temporarily different.", "Moved Temporarily - The requested address is temporarily unavailable and has a new temporary address."),
        (305, "You must use a specific network route.", "Use Proxy - The client must use the specified proxy to reach the destination."),
        (380, "Alternative communication method available.", "Alternative Service - The request cannot be fulfilled, but an alternative service is available."),
        // 4xx request failure
        (400, "Invalid call request. Check the number.", "Bad Request - The request could not be understood due to malformed syntax."),
        (401, "Authentication required to complete the call.", "Unauthorized - The request requires user authentication."),
        (403, "Call blocked or not allowed.", "Forbidden - The server understood the request but refuses to authorize it."),
        (404, "Phone number or user not found.", "Not Found - The requested user could not be located on the server."),
        (405, "Calling method not permitted.", "Method Not Allowed - The specified method is not allowed for the requested address."),
        (406, "Call cannot be completed due to incompatible settings.", "Not Acceptable - The requested resource cannot generate content matching the client's Accept headers."),
        (407, "Proxy authentication needed.", "Proxy Authentication Required - The client must first authenticate with the proxy."),
        (408, "No response from the destination. Timeout occurred.", "Request Timeout - No response was received from the destination in a timely manner."),
        (410, "Number is no longer in service.", "Gone - The requested resource is no longer available and will not be available again."),
        (413, "Call request too large to process.", "Request Entity Too Large - The request payload exceeds server processing capabilities."),
        (414, "Phone number too complicated to dial.", "Request-URI Too Long - The request URI exceeds the server's maximum processing length."),
        (415, "Unsupported communication method.", "Unsupported Media Type - The request includes a media type the server cannot process."),
        (416, "Unrecognized phone number format.", "Unsupported URI Scheme - The request contains a URI scheme the server does not support."),
        (420, "Unsupported communication feature.", "Bad Extension - The server does not understand a specified SIP extension."),
        (421, "Missing required communication feature.", "Extension Required - The server requires a specific extension not present in the request."),
        (423, "Call setup time too short.", "Interval Too Brief - The request's expiration interval is too short."),
        (480, "Destination temporarily unavailable.", "Temporarily Unavailable - The destination cannot be reached but might be available later."),
        (481, "Call cannot be found or tracked.", "Call/Transaction Does Not Exist - The call or transaction referenced does not exist."),
        (482, "Call routing has created a loop.", "Loop Detected - The request indicates a loop in the routing path."),
        (483, "Too many network hops to complete call.", "Too Many Hops - Maximum number of routing hops has been exceeded."),
        (484, "Incomplete phone number.", "Address Incomplete - The request URI is incomplete."),
        (485, "Unclear which number to call.", "Ambiguous - The request URI is ambiguous and could not be resolved uniquely."),
        (486, "Destination is currently busy.", "Busy Here - The destination is currently busy and cannot accept the call."),
        (487, "Call was cancelled or stopped.", "Request Terminated - The request was terminated by the user or network."),
        (488, "Call cannot be accepted by recipient.", "Not Acceptable Here - The request cannot be accepted by the recipient."),
        // 5xx server failure
        (500, "Network error. Unable to complete call.", "Server Internal Error - An unexpected condition prevented request fulfillment."),
        (501, "Call feature not supported.", "Not Implemented - The server does not support the functionality required."),
        (502, "Network routing problem.", "Bad Gateway - The server received an invalid response from another server."),
        (503, "Network overloaded or maintenance.", "Service Unavailable - The server is temporarily overloaded or under maintenance."),
        (504, "Network route timeout.", "Server Time-out - No response received from an upstream server."),
        (505, "Unsupported communication protocol.", "Version Not Supported - The SIP version is not supported."),
        (513, "Call request too large.", "Message Too Large - The message exceeds the server's processing capabilities."),
        // 6xx global failure
        (600, "User is busy everywhere.", "Busy Everywhere - The requested user is busy across all possible locations."),
        (603, "Call explicitly rejected.", "Decline - The user explicitly declines the call."),
        (604, "User does not exist.", "Does Not Exist Anywhere - The user cannot be found at any location."),
        (606, "Call settings prevent connection.", "Not Acceptable - The user's preferences do not allow the call to be completed."),
    ];
    entries
        .iter()
        .map(|&(code, simple, detailed)| (code, SipExplanation { simple, detailed }))
        .collect()
});

pub static SUBCODES: Lazy<HashMap<u32, SubcodeExplanation>> = Lazy::new(|| {
    let entries: &[(u32, &'static str, &'static str, &'static str)] = &[
        (
            560486,
            "Network busy or user unavailable",
            "The destination user agent or network is temporarily unavailable",
            "Retry the call after a brief delay. If persistent, check network conditions.",
        ),
        (
            560487,
            "Call cancelled or network timeout",
            "The call was terminated due to timeout or user cancellation",
            "Check network latency and connection stability.",
        ),
        (
            560404,
            "User or number not found",
            "The dialed number is invalid or user does not exist",
            "Verify the phone number and user existence in the system.",
        ),
        (
            560480,
            "Temporary service interruption",
            "Service is temporarily unavailable",
            "Wait for service restoration and retry. Check service status.",
        ),
        (
            560503,
            "Service currently unavailable",
            "System overload or maintenance",
            "Wait for service restoration. If persistent, contact support.",
        ),
        (
            0,
            "No additional details available",
            "No information available",
            "No action required.",
        ),
    ];
    entries
        .iter()
        .map(|&(code, description, cause, resolution)| {
            (
                code,
                SubcodeExplanation {
                    description,
                    cause,
                    resolution,
                },
            )
        })
        .collect()
});

pub fn explain_code(code: u16) -> Option<&'static SipExplanation> {
    SIP_CODES.get(&code)
}

pub fn explain_subcode(subcode: u32) -> &'static SubcodeExplanation {
    SUBCODES.get(&subcode).unwrap_or(&UNKNOWN_SUBCODE)
}
