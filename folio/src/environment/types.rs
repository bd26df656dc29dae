use folio_core_contact_impl::ContactServiceImpl;
use folio_email_impl::EmailServiceImpl;
use folio_extern_impl::turnstile::TurnstileApiServiceImpl;
use folio_shared_impl::captcha::CaptchaServiceImpl;

// API
pub type RestServer = folio_api_rest::RestServer<ContactFeature>;

// Email
pub type Email = EmailServiceImpl;

// Extern
pub type TurnstileApi = TurnstileApiServiceImpl;

// Shared
pub type Captcha = CaptchaServiceImpl<TurnstileApi>;

// Core
pub type ContactFeature = ContactServiceImpl<Captcha, Email>;
