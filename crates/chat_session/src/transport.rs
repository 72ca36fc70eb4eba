use chat_api::{ChatApiClient, ChatApiError, ChatRequest, ChatResponse};
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;

/// Issues one chat request and hands back the classified response.
pub trait ChatTransport {
    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> LocalBoxFuture<'a, Result<ChatResponse, ChatApiError>>;
}

impl ChatTransport for ChatApiClient {
    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> LocalBoxFuture<'a, Result<ChatResponse, ChatApiError>> {
        ChatApiClient::send(self, request).boxed_local()
    }
}

impl<T: ChatTransport + ?Sized> ChatTransport for &T {
    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> LocalBoxFuture<'a, Result<ChatResponse, ChatApiError>> {
        (**self).send(request)
    }
}
