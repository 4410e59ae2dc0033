mod health_test;
mod lms_test;
mod lti_test;
mod submissions_test;
