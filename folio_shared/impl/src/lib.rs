pub mod captcha;
