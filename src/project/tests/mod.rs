mod tests_package_walker;
