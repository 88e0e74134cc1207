//! Provider-neutral completion request.

/// An image inlined into the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 encoded bytes.
    pub data: String,
}

impl InlineImage {
    /// `data:` URL form accepted by chat completion APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// A single generation request: instruction, text and images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System instruction.
    pub system: String,
    /// User text (concatenated fragments).
    pub text: String,
    /// Images, in bundle order.
    pub images: Vec<InlineImage>,
}
